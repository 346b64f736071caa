//! Clearing price computation for batch matching.
//!
//! The matcher walks buy levels down from the top of the book and sell
//! levels up from the bottom until they stop crossing. The clearing price
//! is the midpoint of the last buy level and the last sell level that took
//! part in a fill, so it never leaves `[last sell, last buy]` and every
//! filled order trades at or better than its limit.

use batchdex_types::{Amount, math};
use rust_decimal::Decimal;

use crate::{OrderBook, matcher};

/// Result of clearing a book.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClearingResult {
    /// Uniform price of every fill, if anything crossed.
    pub clearing_price: Option<Decimal>,
    /// Total amount of Y exchanged.
    pub matched_amount: Amount,
    /// Lowest buy level that received a fill.
    pub last_buy_price: Option<Decimal>,
    /// Highest sell level that received a fill.
    pub last_sell_price: Option<Decimal>,
}

impl ClearingResult {
    #[must_use]
    pub fn has_trades(&self) -> bool {
        self.clearing_price.is_some()
    }
}

/// Midpoint of two crossing levels at the engine's price precision.
#[must_use]
pub fn clearing_price(last_buy_price: Decimal, last_sell_price: Decimal) -> Decimal {
    math::round_price((last_buy_price + last_sell_price) / Decimal::TWO)
}

/// What clearing `book` would produce, without touching it.
#[must_use]
pub fn compute_clearing(book: &OrderBook) -> ClearingResult {
    let mut scratch = book.clone();
    matcher::cross(&mut scratch).clearing()
}
