//! The per-block batch pipeline and the cleanup pass.
//!
//! ```text
//! begin block:  delete_outdated_requests
//! end block:    execute_requests
//!                 1. match every pair (ascending pair id)
//!                 2. expire orders past their expiration time
//!                 3. execute pending deposit requests
//!                 4. execute pending withdraw requests
//! ```
//!
//! Records finished in block N stay readable until the cleanup pass at the
//! start of block N+1.

use std::collections::BTreeMap;

use batchdex_store::KvStore;
use batchdex_types::{BlockContext, OrderStatus, PairId, RequestStatus, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::keeper::Keeper;
use crate::ledger::Ledger;

/// Summary of one batch execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub height: u64,
    pub pairs_matched: usize,
    pub trades: usize,
    /// Trade root of every matched pair.
    pub trade_roots: BTreeMap<PairId, [u8; 32]>,
    pub orders_expired: usize,
    pub deposits_executed: usize,
    pub withdraws_executed: usize,
}

/// Records removed by one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deposit_requests: usize,
    pub withdraw_requests: usize,
    pub orders: usize,
}

impl CleanupReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.deposit_requests + self.withdraw_requests + self.orders
    }
}

impl<S: KvStore, L: Ledger> Keeper<S, L> {
    /// Run the batch pipeline for the block.
    ///
    /// # Panics
    ///
    /// Panics if any step fails. A half-applied batch must never be
    /// committed, so the node halts instead.
    pub fn execute_requests(&mut self, ctx: &BlockContext) -> BatchReport {
        match self.try_execute_requests(ctx) {
            Ok(report) => report,
            Err(err) => {
                error!(height = ctx.height, error = %err, "batch execution failed");
                panic!("batch execution failed at height {}: {err}", ctx.height);
            }
        }
    }

    /// [`Self::execute_requests`] returning the first error instead of
    /// panicking. State may be partially updated when it returns `Err`.
    pub fn try_execute_requests(&mut self, ctx: &BlockContext) -> Result<BatchReport> {
        let mut report = BatchReport {
            height: ctx.height,
            ..BatchReport::default()
        };

        self.iterate_all_pairs(|k, pair| {
            let result = k.execute_matching(ctx, pair)?;
            report.pairs_matched += 1;
            report.trades += result.trades.len();
            report.trade_roots.insert(result.pair_id, result.trade_root);
            Ok(false)
        })?;

        self.iterate_all_orders(|k, order| {
            if order.status != OrderStatus::Completed
                && !order.status.is_canceled_or_expired()
                && order.is_expired_at(ctx.time)
            {
                k.finish_order(order, OrderStatus::Expired)?;
                report.orders_expired += 1;
            }
            Ok(false)
        })?;

        self.iterate_all_deposit_requests(|k, req| {
            if req.status == RequestStatus::NotExecuted {
                k.execute_deposit_request(req)?;
                report.deposits_executed += 1;
            }
            Ok(false)
        })?;

        self.iterate_all_withdraw_requests(|k, req| {
            if req.status == RequestStatus::NotExecuted {
                k.execute_withdraw_request(req)?;
                report.withdraws_executed += 1;
            }
            Ok(false)
        })?;

        info!(
            height = report.height,
            pairs = report.pairs_matched,
            trades = report.trades,
            expired = report.orders_expired,
            deposits = report.deposits_executed,
            withdraws = report.withdraws_executed,
            "batch executed"
        );
        Ok(report)
    }

    /// Delete requests and orders whose status is terminal.
    ///
    /// Failures are logged and skipped; the record is retried on the next
    /// pass.
    pub fn delete_outdated_requests(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();

        let walk = self.iterate_all_deposit_requests(|k, req| {
            if req.status.should_be_deleted() {
                match k.delete_deposit_request(&req) {
                    Ok(()) => report.deposit_requests += 1,
                    Err(err) => {
                        warn!(pool_id = %req.pool_id, request_id = %req.id, error = %err, "failed to delete deposit request");
                    }
                }
            }
            Ok(false)
        });
        if let Err(err) = walk {
            warn!(error = %err, "deposit request cleanup aborted");
        }

        let walk = self.iterate_all_withdraw_requests(|k, req| {
            if req.status.should_be_deleted() {
                match k.delete_withdraw_request(&req) {
                    Ok(()) => report.withdraw_requests += 1,
                    Err(err) => {
                        warn!(pool_id = %req.pool_id, request_id = %req.id, error = %err, "failed to delete withdraw request");
                    }
                }
            }
            Ok(false)
        });
        if let Err(err) = walk {
            warn!(error = %err, "withdraw request cleanup aborted");
        }

        let walk = self.iterate_all_orders(|k, order| {
            if order.status.should_be_deleted() {
                match k.delete_order(&order) {
                    Ok(()) => report.orders += 1,
                    Err(err) => {
                        warn!(pair_id = %order.pair_id, order_id = %order.id, error = %err, "failed to delete order");
                    }
                }
            }
            Ok(false)
        });
        if let Err(err) = walk {
            warn!(error = %err, "order cleanup aborted");
        }

        report
    }
}
