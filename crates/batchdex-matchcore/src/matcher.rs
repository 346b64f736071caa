//! Pure deterministic batch matcher.
//!
//! ```text
//! match_orders(pair, batch, &mut OrderBook) -> MatchResult
//! ```
//!
//! ## Algorithm
//!
//! 1. Start at the highest buy (`XToY`) level and the lowest sell (`YToX`)
//!    level, found with the book's extremum searches.
//! 2. While the buy level's price is at least the sell level's price, fill
//!    the front open buy order against the front open sell order for the
//!    smaller open amount. Inside a level orders fill in insertion order.
//! 3. An exhausted level is left for the next one in its direction and is
//!    never revisited.
//! 4. Every fill settles at the uniform clearing price (see
//!    [`crate::clearing`]) with a quote amount of `floor(quantity × price)`.
//! 5. A trade root over all trades allows cross-node verification.

use batchdex_types::{Amount, BatchId, PairId, Result, Trade, TradeId, TradeParty, math};
use rust_decimal::Decimal;
use tracing::debug;

use crate::clearing::{ClearingResult, clearing_price};
use crate::determinism::compute_trade_root;
use crate::{BookOrder, OrderBook};

/// Output of matching one pair's book for one batch.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub pair_id: PairId,
    pub batch_id: BatchId,
    pub clearing: ClearingResult,
    /// Fills in execution order.
    pub trades: Vec<Trade>,
    pub trade_root: [u8; 32],
}

impl MatchResult {
    #[must_use]
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }
}

/// Position of a filled order inside the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub level: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Fill {
    pub buy: Slot,
    pub sell: Slot,
    pub quantity: Amount,
}

#[derive(Debug, Default)]
pub(crate) struct Crossing {
    pub fills: Vec<Fill>,
    pub last_buy_price: Option<Decimal>,
    pub last_sell_price: Option<Decimal>,
}

impl Crossing {
    pub fn clearing(&self) -> ClearingResult {
        match (self.last_buy_price, self.last_sell_price) {
            (Some(buy), Some(sell)) => ClearingResult {
                clearing_price: Some(clearing_price(buy, sell)),
                matched_amount: self.fills.iter().map(|f| f.quantity).sum(),
                last_buy_price: Some(buy),
                last_sell_price: Some(sell),
            },
            _ => ClearingResult::default(),
        }
    }
}

fn next_open(orders: &[BookOrder], from: usize) -> Option<usize> {
    orders
        .iter()
        .skip(from)
        .position(|o| o.open_amount > 0)
        .map(|offset| from + offset)
}

/// Walk the crossing part of the book, reducing open amounts in place.
pub(crate) fn cross(book: &mut OrderBook) -> Crossing {
    let mut crossing = Crossing::default();
    let mut buy_level = book.highest_price_x_to_y_order_group_index(0);
    let mut sell_level = book
        .len()
        .checked_sub(1)
        .and_then(|last| book.lowest_price_y_to_x_order_group_index(last));
    let mut buy_from = 0;
    let mut sell_from = 0;

    while let (Some(b), Some(s)) = (buy_level, sell_level) {
        let buy_price = book.groups()[b].price;
        let sell_price = book.groups()[s].price;
        if buy_price < sell_price {
            break;
        }

        let Some(bi) = next_open(&book.groups()[b].x_to_y_orders, buy_from) else {
            buy_level = book.highest_price_x_to_y_order_group_index(b + 1);
            buy_from = 0;
            continue;
        };
        let Some(si) = next_open(&book.groups()[s].y_to_x_orders, sell_from) else {
            sell_level = s
                .checked_sub(1)
                .and_then(|i| book.lowest_price_y_to_x_order_group_index(i));
            sell_from = 0;
            continue;
        };
        buy_from = bi;
        sell_from = si;

        let groups = book.groups_mut();
        let quantity = groups[b].x_to_y_orders[bi]
            .open_amount
            .min(groups[s].y_to_x_orders[si].open_amount);
        groups[b].x_to_y_orders[bi].open_amount -= quantity;
        groups[s].y_to_x_orders[si].open_amount -= quantity;

        crossing.fills.push(Fill {
            buy: Slot { level: b, index: bi },
            sell: Slot { level: s, index: si },
            quantity,
        });
        crossing.last_buy_price = Some(buy_price);
        crossing.last_sell_price = Some(sell_price);
    }

    crossing
}

/// Match a pair's book for one batch.
///
/// Open amounts of the book's orders are reduced by their fills, so the
/// caller can read each order's outcome from the book afterwards.
pub fn match_orders(pair_id: PairId, batch_id: BatchId, book: &mut OrderBook) -> Result<MatchResult> {
    let crossing = cross(book);
    let clearing = crossing.clearing();

    let Some(price) = clearing.clearing_price else {
        return Ok(MatchResult {
            pair_id,
            batch_id,
            clearing,
            trades: vec![],
            trade_root: compute_trade_root(&[]),
        });
    };

    let mut trades = Vec::with_capacity(crossing.fills.len());
    let mut fill_seq: u64 = 0;
    for fill in &crossing.fills {
        let buyer = &book.groups()[fill.buy.level].x_to_y_orders[fill.buy.index];
        let seller = &book.groups()[fill.sell.level].y_to_x_orders[fill.sell.index];
        let trade = Trade {
            id: TradeId::deterministic(pair_id, batch_id, fill_seq),
            pair_id,
            batch_id,
            buyer: TradeParty {
                source: buyer.source,
                address: buyer.orderer.clone(),
            },
            seller: TradeParty {
                source: seller.source,
                address: seller.orderer.clone(),
            },
            price,
            quantity: fill.quantity,
            quote_amount: math::mul_floor(fill.quantity, price)?,
        };
        debug!(%trade, "fill");
        trades.push(trade);
        fill_seq += 1;
    }

    let trade_root = compute_trade_root(&trades);
    Ok(MatchResult {
        pair_id,
        batch_id,
        clearing,
        trades,
        trade_root,
    })
}
