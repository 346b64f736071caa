//! Execution of pending deposit and withdraw requests.
//!
//! A request that cannot be honoured or priced is marked `Failed` and its
//! escrowed coins are refunded; only store or ledger errors are returned.

use batchdex_matchcore::{deposit_outcome, withdraw_outcome};
use batchdex_store::KvStore;
use batchdex_types::constants::MAX_AMOUNT;
use batchdex_types::{
    Address, Amount, Coin, DepositRequest, DexError, Pair, Pool, PoolId, Result, WithdrawRequest,
};
use tracing::{debug, warn};

use crate::keeper::Keeper;
use crate::ledger::Ledger;

/// Whether `reserve + added` stays within [`MAX_AMOUNT`].
fn within_max(reserve: Amount, added: Amount) -> bool {
    reserve.checked_add(added).is_some_and(|total| total <= MAX_AMOUNT)
}

impl<S: KvStore, L: Ledger> Keeper<S, L> {
    fn pool_and_pair(&self, pool_id: PoolId) -> Result<(Pool, Pair)> {
        let pool = self
            .get_pool(pool_id)?
            .ok_or(DexError::PoolNotFound(pool_id))?;
        let pair = self
            .get_pair(pool.pair_id)?
            .ok_or(DexError::PairNotFound(pool.pair_id))?;
        Ok((pool, pair))
    }

    pub fn execute_deposit_request(&mut self, mut req: DepositRequest) -> Result<()> {
        let escrow = Address::global_escrow();
        let (pool, pair) = self.pool_and_pair(req.pool_id)?;
        let [deposit_x, deposit_y] = &req.deposit_coins;

        let outcome = if pool.disabled {
            None
        } else {
            let (reserve_x, reserve_y) = self.get_pool_reserves(&pool, &pair);
            if within_max(reserve_x, deposit_x.amount) && within_max(reserve_y, deposit_y.amount) {
                deposit_outcome(
                    reserve_x,
                    reserve_y,
                    self.get_pool_coin_supply(&pool),
                    deposit_x.amount,
                    deposit_y.amount,
                )
                .unwrap_or_else(|err| {
                    warn!(pool_id = %req.pool_id, request_id = %req.id, error = %err, "deposit cannot be priced");
                    None
                })
            } else {
                None
            }
        };

        let Some(outcome) = outcome else {
            self.ledger_mut()
                .send_coins(&escrow, &req.depositor, &req.deposit_coins)?;
            req.fail();
            debug!(pool_id = %req.pool_id, request_id = %req.id, "deposit failed");
            return self.set_deposit_request(&req);
        };

        let accepted = [
            Coin::new(deposit_x.denom.clone(), outcome.accepted_x),
            Coin::new(deposit_y.denom.clone(), outcome.accepted_y),
        ];
        let refund = [
            Coin::new(deposit_x.denom.clone(), deposit_x.amount - outcome.accepted_x),
            Coin::new(deposit_y.denom.clone(), deposit_y.amount - outcome.accepted_y),
        ];
        let minted = Coin::new(pool.pool_coin_denom.clone(), outcome.minted);

        self.ledger_mut()
            .send_coins(&escrow, &pool.reserve_address, &accepted)?;
        self.ledger_mut()
            .send_coins(&escrow, &req.depositor, &refund)?;
        self.ledger_mut()
            .mint_coins(&req.depositor, std::slice::from_ref(&minted))?;

        debug!(
            pool_id = %req.pool_id,
            request_id = %req.id,
            accepted_x = outcome.accepted_x,
            accepted_y = outcome.accepted_y,
            minted = outcome.minted,
            "deposit succeeded"
        );
        req.succeed(accepted, minted);
        self.set_deposit_request(&req)
    }

    pub fn execute_withdraw_request(&mut self, mut req: WithdrawRequest) -> Result<()> {
        let escrow = Address::global_escrow();
        let (mut pool, pair) = self.pool_and_pair(req.pool_id)?;

        let outcome = if pool.disabled {
            None
        } else {
            let (reserve_x, reserve_y) = self.get_pool_reserves(&pool, &pair);
            withdraw_outcome(
                reserve_x,
                reserve_y,
                self.get_pool_coin_supply(&pool),
                req.pool_coin.amount,
            )
            .unwrap_or_else(|err| {
                warn!(pool_id = %req.pool_id, request_id = %req.id, error = %err, "withdraw cannot be priced");
                None
            })
        };

        let Some(outcome) = outcome else {
            self.ledger_mut().send_coins(
                &escrow,
                &req.withdrawer,
                std::slice::from_ref(&req.pool_coin),
            )?;
            req.fail();
            debug!(pool_id = %req.pool_id, request_id = %req.id, "withdraw failed");
            return self.set_withdraw_request(&req);
        };

        let withdrawn = [
            Coin::new(pair.x_coin_denom.clone(), outcome.withdrawn_x),
            Coin::new(pair.y_coin_denom.clone(), outcome.withdrawn_y),
        ];
        self.ledger_mut()
            .burn_coins(&escrow, std::slice::from_ref(&req.pool_coin))?;
        self.ledger_mut()
            .send_coins(&pool.reserve_address, &req.withdrawer, &withdrawn)?;

        if outcome.drains_pool {
            pool.disabled = true;
            self.set_pool(&pool)?;
            debug!(pool_id = %pool.id, "pool drained and disabled");
        }
        req.succeed(withdrawn);
        self.set_withdraw_request(&req)
    }
}
