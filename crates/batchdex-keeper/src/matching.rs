//! Per-pair matching and settlement.

use std::collections::BTreeMap;

use batchdex_matchcore::{BookOrder, MatchResult, OrderBook, PoolState, match_orders, pool_orders};
use batchdex_store::KvStore;
use batchdex_types::{
    Address, Amount, BlockContext, Coin, DexError, Order, OrderId, OrderSource, OrderStatus,
    Pair, Result, Trade, TradeParty,
};
use tracing::{debug, info, warn};

use crate::keeper::Keeper;
use crate::ledger::Ledger;

fn sub(a: Amount, b: Amount, what: &str) -> Result<Amount> {
    a.checked_sub(b).ok_or_else(|| DexError::MatchingFailed {
        reason: format!("{what} underflow: {a} - {b}"),
    })
}

fn add(a: Amount, b: Amount, what: &str) -> Result<Amount> {
    a.checked_add(b).ok_or_else(|| DexError::MatchingFailed {
        reason: format!("{what} overflow: {a} + {b}"),
    })
}

/// Account a party pays from: the pair escrow for user orders, the
/// reserve for pool orders.
fn funding_account(pair: &Pair, party: &TradeParty) -> Address {
    match party.source {
        OrderSource::User(_) => pair.escrow_address.clone(),
        OrderSource::Pool(_) => party.address.clone(),
    }
}

fn user_order<'a>(orders: &'a mut BTreeMap<OrderId, Order>, party: &TradeParty) -> Result<Option<&'a mut Order>> {
    match party.source {
        OrderSource::User(id) => orders
            .get_mut(&id)
            .map(Some)
            .ok_or_else(|| DexError::MatchingFailed {
                reason: format!("traded {id} is not in the book"),
            }),
        OrderSource::Pool(_) => Ok(None),
    }
}

impl<S: KvStore, L: Ledger> Keeper<S, L> {
    /// Refund the remaining offer coin and persist the order with a
    /// terminal `status`.
    pub fn finish_order(&mut self, mut order: Order, status: OrderStatus) -> Result<()> {
        if order.remaining_offer_coin.is_positive() {
            let escrow = Address::pair_escrow(order.pair_id);
            self.ledger_mut().send_coins(
                &escrow,
                &order.orderer,
                std::slice::from_ref(&order.remaining_offer_coin),
            )?;
            order.remaining_offer_coin.amount = 0;
        }
        order.status = status;
        debug!(pair_id = %order.pair_id, order_id = %order.id, %status, "order finished");
        self.set_order(&order)
    }

    /// Match one pair for the current batch and settle the trades.
    ///
    /// The pair's batch id advances whether or not anything matched. A pool
    /// whose reserves cannot be priced places no orders in the batch.
    pub fn execute_matching(&mut self, ctx: &BlockContext, mut pair: Pair) -> Result<MatchResult> {
        let mut orders: BTreeMap<OrderId, Order> = self
            .get_orders_by_pair(pair.id)?
            .into_iter()
            .filter(|order| order.is_executable_at(ctx.time))
            .map(|order| (order.id, order))
            .collect();

        let mut book = OrderBook::new();
        book.add_orders(orders.values().map(BookOrder::from_order));

        let prices = book.prices();
        for pool in self.get_pools_by_pair(pair.id)? {
            if pool.disabled {
                continue;
            }
            let (reserve_x, reserve_y) = self.get_pool_reserves(&pool, &pair);
            let state = PoolState {
                pool_id: pool.id,
                reserve_address: pool.reserve_address,
                reserve_x,
                reserve_y,
            };
            match pool_orders(&state, &prices) {
                Ok(pool_book) => book.add_orders(pool_book),
                Err(err) => warn!(
                    pair_id = %pair.id,
                    pool_id = %state.pool_id,
                    error = %err,
                    "pool cannot be priced, left out of this batch"
                ),
            }
        }

        let result = match_orders(pair.id, pair.current_batch_id, &mut book)?;
        for trade in &result.trades {
            self.settle_trade(&pair, trade, &mut orders)?;
        }

        for (_, mut order) in orders {
            if order.is_filled() {
                self.finish_order(order, OrderStatus::Completed)?;
            } else {
                order.status = if order.filled_amount() > 0 {
                    OrderStatus::PartiallyMatched
                } else {
                    OrderStatus::NotMatched
                };
                self.set_order(&order)?;
            }
        }

        if result.has_trades() {
            pair.last_price = result.clearing.clearing_price;
        }
        pair.current_batch_id = pair.current_batch_id.next();
        self.set_pair(&pair)?;

        info!(
            pair_id = %pair.id,
            batch_id = %result.batch_id,
            trades = result.trades.len(),
            matched = result.clearing.matched_amount,
            clearing_price = ?result.clearing.clearing_price,
            trade_root = %hex::encode(result.trade_root),
            "pair matched"
        );
        Ok(result)
    }

    /// Move the coins of one trade and record it on the user orders.
    fn settle_trade(
        &mut self,
        pair: &Pair,
        trade: &Trade,
        orders: &mut BTreeMap<OrderId, Order>,
    ) -> Result<()> {
        let base = Coin::new(pair.y_coin_denom.clone(), trade.quantity);
        let quote = Coin::new(pair.x_coin_denom.clone(), trade.quote_amount);

        let seller_funds = funding_account(pair, &trade.seller);
        let buyer_funds = funding_account(pair, &trade.buyer);
        self.ledger_mut()
            .send_coins(&seller_funds, &trade.buyer.address, &[base])?;
        self.ledger_mut()
            .send_coins(&buyer_funds, &trade.seller.address, &[quote])?;

        if let Some(buyer) = user_order(orders, &trade.buyer)? {
            buyer.open_amount = sub(buyer.open_amount, trade.quantity, "open amount")?;
            buyer.remaining_offer_coin.amount = sub(
                buyer.remaining_offer_coin.amount,
                trade.quote_amount,
                "remaining offer",
            )?;
            buyer.received_coin.amount = add(buyer.received_coin.amount, trade.quantity, "received")?;
        }
        if let Some(seller) = user_order(orders, &trade.seller)? {
            seller.open_amount = sub(seller.open_amount, trade.quantity, "open amount")?;
            seller.remaining_offer_coin.amount = sub(
                seller.remaining_offer_coin.amount,
                trade.quantity,
                "remaining offer",
            )?;
            seller.received_coin.amount =
                add(seller.received_coin.amount, trade.quote_amount, "received")?;
        }
        Ok(())
    }
}
