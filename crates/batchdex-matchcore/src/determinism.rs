//! Determinism verification utilities for cross-node consistency.
//!
//! Every node matching the same book must produce the exact same trades.
//! The `trade_root` is a hash over all trades that enables quick
//! verification without comparing full payloads.

use batchdex_types::{OrderSource, Trade};
use sha2::{Digest, Sha256};

fn hash_source(hasher: &mut Sha256, source: OrderSource) {
    match source {
        OrderSource::User(id) => {
            hasher.update([0u8]);
            hasher.update(id.0.to_be_bytes());
        }
        OrderSource::Pool(id) => {
            hasher.update([1u8]);
            hasher.update(id.0.to_be_bytes());
        }
    }
}

/// Compute the trade root hash over a set of trades.
///
/// The same trades in the same order always produce the same root.
#[must_use]
pub fn compute_trade_root(trades: &[Trade]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"batchdex:trade_root:v1:");
    hasher.update((trades.len() as u64).to_be_bytes());

    for trade in trades {
        hasher.update(trade.id.0);
        hasher.update(trade.pair_id.0.to_be_bytes());
        hasher.update(trade.batch_id.0.to_be_bytes());
        hash_source(&mut hasher, trade.buyer.source);
        hasher.update(trade.buyer.address.as_bytes());
        hash_source(&mut hasher, trade.seller.source);
        hasher.update(trade.seller.address.as_bytes());
        hasher.update(trade.price.normalize().to_string().as_bytes());
        hasher.update(trade.quantity.to_be_bytes());
        hasher.update(trade.quote_amount.to_be_bytes());
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Recompute the root from `trades` and compare it with `expected_root`.
#[must_use]
pub fn verify_trade_root(trades: &[Trade], expected_root: &[u8; 32]) -> bool {
    compute_trade_root(trades) == *expected_root
}

#[cfg(test)]
mod tests {
    use batchdex_types::*;
    use rust_decimal::Decimal;

    use super::*;

    fn make_trade(batch: u64, fill_seq: u64) -> Trade {
        Trade {
            id: TradeId::deterministic(PairId(1), BatchId(batch), fill_seq),
            pair_id: PairId(1),
            batch_id: BatchId(batch),
            buyer: TradeParty {
                source: OrderSource::User(OrderId(1)),
                address: Address::new("dex1alice"),
            },
            seller: TradeParty {
                source: OrderSource::User(OrderId(2)),
                address: Address::new("dex1bob"),
            },
            price: Decimal::new(50_000, 0),
            quantity: 1,
            quote_amount: 50_000,
        }
    }

    #[test]
    fn empty_trades_deterministic() {
        assert_eq!(compute_trade_root(&[]), compute_trade_root(&[]));
    }

    #[test]
    fn different_trades_different_root() {
        let root_a = compute_trade_root(&[make_trade(1, 0)]);
        let root_b = compute_trade_root(&[make_trade(1, 1)]);
        assert_ne!(root_a, root_b);
    }

    #[test]
    fn order_matters() {
        let t1 = make_trade(1, 0);
        let t2 = make_trade(1, 1);
        let root_ab = compute_trade_root(&[t1.clone(), t2.clone()]);
        let root_ba = compute_trade_root(&[t2, t1]);
        assert_ne!(root_ab, root_ba, "Order of trades must affect root hash");
    }

    #[test]
    fn price_representation_does_not_matter() {
        let a = make_trade(1, 0);
        let mut b = a.clone();
        b.price = "50000.000".parse().unwrap();
        assert_eq!(compute_trade_root(&[a]), compute_trade_root(&[b]));
    }

    #[test]
    fn pool_and_user_sources_differ() {
        let a = make_trade(1, 0);
        let mut b = a.clone();
        b.seller.source = OrderSource::Pool(PoolId(2));
        assert_ne!(compute_trade_root(&[a]), compute_trade_root(&[b]));
    }

    #[test]
    fn verify_roots() {
        let trades = vec![make_trade(1, 0), make_trade(1, 1)];
        let root = compute_trade_root(&trades);
        assert!(verify_trade_root(&trades, &root));
        assert!(!verify_trade_root(&trades, &[0xAB; 32]));
    }
}
