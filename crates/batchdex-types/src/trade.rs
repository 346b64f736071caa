//! Trade types produced by the batch matcher.
//!
//! A [`Trade`] is the record of a fill between an `XToY` order (buyer of Y)
//! and a `YToX` order (seller of Y) at the batch's uniform clearing price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BatchId, OrderId, PairId, PoolId, TradeId};

/// Where a book order comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSource {
    /// A persisted limit order.
    User(OrderId),
    /// A synthetic order placed by a pool for one price level.
    Pool(PoolId),
}

impl std::fmt::Display for OrderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::Pool(id) => write!(f, "{id}"),
        }
    }
}

/// One side of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeParty {
    pub source: OrderSource,
    pub address: Address,
}

/// A fill produced by the batch matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Deterministic from pair, batch and fill sequence.
    pub id: TradeId,
    pub pair_id: PairId,
    pub batch_id: BatchId,
    /// Offers X, receives `quantity` Y.
    pub buyer: TradeParty,
    /// Offers Y, receives `quote_amount` X.
    pub seller: TradeParty,
    /// Uniform clearing price of the batch.
    pub price: Decimal,
    /// Executed amount of Y.
    pub quantity: Amount,
    /// `floor(quantity × price)` of X.
    pub quote_amount: Amount,
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} {} {} <- {} {} @ {} = {}",
            self.id,
            self.pair_id,
            self.batch_id,
            self.buyer.source,
            self.seller.source,
            self.quantity,
            self.price,
            self.quote_amount,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trade() -> Trade {
        Trade {
            id: TradeId::deterministic(PairId(1), BatchId(1), 0),
            pair_id: PairId(1),
            batch_id: BatchId(1),
            buyer: TradeParty {
                source: OrderSource::User(OrderId(1)),
                address: Address::new("dex1alice"),
            },
            seller: TradeParty {
                source: OrderSource::Pool(PoolId(1)),
                address: Address::pool_reserve(PoolId(1)),
            },
            price: Decimal::new(125, 2),
            quantity: 8,
            quote_amount: 10,
        }
    }

    #[test]
    fn trade_display() {
        let s = format!("{}", make_trade());
        assert!(s.contains("pair:1"));
        assert!(s.contains("order:1"));
        assert!(s.contains("pool:1"));
        assert!(s.contains("1.25"));
    }

    #[test]
    fn trade_serde_roundtrip() {
        let trade = make_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }

    #[test]
    fn user_sources_sort_before_pool_sources() {
        assert!(OrderSource::User(OrderId(99)) < OrderSource::Pool(PoolId(1)));
    }
}
