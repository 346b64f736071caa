//! Order types for the batchdex engine.
//!
//! A pair trades its X coin (quote) against its Y coin (base); prices are
//! X per one unit of Y and order amounts are integer units of Y.
//!
//! - `XToY` orders offer X and buy Y. Their offer is `ceil(amount × price)` X.
//! - `YToX` orders offer Y and sell it for X. Their offer is `amount` Y.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BatchId, Coin, OrderId, PairId, Result, math};

/// Which coin the order offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Offers X, buys Y.
    XToY,
    /// Offers Y, sells it for X.
    YToX,
}

impl SwapDirection {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::XToY => Self::YToX,
            Self::YToX => Self::XToY,
        }
    }
}

impl std::fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XToY => write!(f, "X_TO_Y"),
            Self::YToX => write!(f, "Y_TO_X"),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Submitted, not yet through a batch.
    NotExecuted,
    /// Went through at least one batch without any fill.
    NotMatched,
    /// Partially filled; the rest stays open.
    PartiallyMatched,
    /// Fully filled.
    Completed,
    /// Cancelled by the orderer.
    Canceled,
    /// Reached its expiration time while still open.
    Expired,
}

impl OrderStatus {
    /// Whether the order may still take part in matching.
    #[must_use]
    pub fn is_matchable(self) -> bool {
        matches!(
            self,
            Self::NotExecuted | Self::NotMatched | Self::PartiallyMatched
        )
    }

    #[must_use]
    pub fn is_canceled_or_expired(self) -> bool {
        matches!(self, Self::Canceled | Self::Expired)
    }

    /// No further matching or refund ever happens from a terminal status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Completed || self.is_canceled_or_expired()
    }

    /// Whether the cleanup pass may delete an order in this status.
    #[must_use]
    pub fn should_be_deleted(self) -> bool {
        self.is_terminal()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExecuted => write!(f, "NOT_EXECUTED"),
            Self::NotMatched => write!(f, "NOT_MATCHED"),
            Self::PartiallyMatched => write!(f, "PARTIALLY_MATCHED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A persisted limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub pair_id: PairId,
    /// Height of the block the order was submitted in.
    pub msg_height: u64,
    pub orderer: Address,
    pub direction: SwapDirection,
    /// Coin escrowed at submission.
    pub offer_coin: Coin,
    /// Part of the offer still held in the pair escrow.
    pub remaining_offer_coin: Coin,
    /// Total coin received from fills so far.
    pub received_coin: Coin,
    pub price: Decimal,
    /// Original amount of Y.
    pub amount: Amount,
    /// Amount of Y still open for matching.
    pub open_amount: Amount,
    /// Batch of the pair the order was submitted in.
    pub batch_id: BatchId,
    pub expire_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Offer amount an order must escrow.
    pub fn offer_amount(direction: SwapDirection, price: Decimal, amount: Amount) -> Result<Amount> {
        match direction {
            SwapDirection::XToY => math::mul_ceil(amount, price),
            SwapDirection::YToX => Ok(amount),
        }
    }

    /// Amount of Y filled so far.
    #[must_use]
    pub fn filled_amount(&self) -> Amount {
        self.amount - self.open_amount
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.open_amount == 0
    }

    /// Expired at `now` when `now` is not strictly before `expire_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_at
    }

    /// Whether the order can be put in a book at `now`.
    #[must_use]
    pub fn is_executable_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_matchable() && self.open_amount > 0 && !self.is_expired_at(now)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// An open order of pair 1 in denominations `denom1`/`denom2`
    /// (X = `denom1`, Y = `denom2`).
    pub fn dummy(id: u64, direction: SwapDirection, price: Decimal, amount: Amount) -> Self {
        use chrono::TimeZone;

        let offer = Self::offer_amount(direction, price, amount).unwrap_or(0);
        let (offer_denom, receive_denom) = match direction {
            SwapDirection::XToY => ("denom1", "denom2"),
            SwapDirection::YToX => ("denom2", "denom1"),
        };
        Self {
            id: OrderId(id),
            pair_id: PairId(1),
            msg_height: 1,
            orderer: Address::new(format!("dex1orderer{id}")),
            direction,
            offer_coin: Coin::new(offer_denom, offer),
            remaining_offer_coin: Coin::new(offer_denom, offer),
            received_coin: Coin::zero(receive_denom),
            price,
            amount,
            open_amount: amount,
            batch_id: BatchId(1),
            expire_at: Utc
                .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            status: OrderStatus::NotExecuted,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn offer_amount_by_direction() {
        let price: Decimal = "1.5".parse().unwrap();
        assert_eq!(Order::offer_amount(SwapDirection::XToY, price, 3).unwrap(), 5);
        assert_eq!(Order::offer_amount(SwapDirection::YToX, price, 3).unwrap(), 3);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(!OrderStatus::NotExecuted.is_terminal());
        assert!(!OrderStatus::PartiallyMatched.is_terminal());
        assert!(OrderStatus::Expired.should_be_deleted());
        assert!(!OrderStatus::NotMatched.should_be_deleted());
    }

    #[test]
    fn matchable_statuses() {
        assert!(OrderStatus::NotExecuted.is_matchable());
        assert!(OrderStatus::NotMatched.is_matchable());
        assert!(OrderStatus::PartiallyMatched.is_matchable());
        assert!(!OrderStatus::Completed.is_matchable());
    }

    #[test]
    fn expiration_boundary_is_inclusive() {
        let mut order = Order::dummy(1, SwapDirection::XToY, Decimal::ONE, 10);
        let t = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        order.expire_at = t;
        assert!(order.is_expired_at(t));
        assert!(!order.is_expired_at(t - chrono::Duration::nanoseconds(1)));
        assert!(!order.is_executable_at(t));
    }

    #[test]
    fn fill_tracking() {
        let mut order = Order::dummy(1, SwapDirection::YToX, Decimal::ONE, 10);
        assert!(!order.is_filled());
        order.open_amount = 4;
        assert_eq!(order.filled_amount(), 6);
        order.open_amount = 0;
        assert!(order.is_filled());
    }

    #[test]
    fn direction_display_and_opposite() {
        assert_eq!(format!("{}", SwapDirection::XToY), "X_TO_Y");
        assert_eq!(SwapDirection::XToY.opposite(), SwapDirection::YToX);
    }

    #[test]
    fn order_serde_roundtrip() {
        let order = Order::dummy(7, SwapDirection::XToY, "12.25".parse().unwrap(), 100);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
