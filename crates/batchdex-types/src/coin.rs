//! Account addresses and coin amounts.
//!
//! Amounts are unsigned integers in the smallest unit of a denomination.
//! Module-owned accounts (pair escrows, pool reserves, the request escrow)
//! are derived by hashing a module name, so every node agrees on them
//! without any registry.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{PairId, PoolId, constants};

/// Integer coin amount.
pub type Amount = u128;

/// An account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Derive a module account address from a module name and a numeric id.
    ///
    /// `dex1` followed by the hex of the first 20 bytes of
    /// `SHA-256(name || id_be)`.
    #[must_use]
    pub fn module(name: &str, id: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(id.to_be_bytes());
        let hash = hasher.finalize();
        Self(format!(
            "{}{}",
            constants::ADDRESS_PREFIX,
            hex::encode(&hash[..20])
        ))
    }

    /// Escrow account holding the offer coins of a pair's open orders.
    #[must_use]
    pub fn pair_escrow(pair_id: PairId) -> Self {
        Self::module(constants::PAIR_ESCROW_MODULE, pair_id.0)
    }

    /// Reserve account of a pool.
    #[must_use]
    pub fn pool_reserve(pool_id: PoolId) -> Self {
        Self::module(constants::POOL_RESERVE_MODULE, pool_id.0)
    }

    /// Escrow account holding coins of pending deposit/withdraw requests.
    #[must_use]
    pub fn global_escrow() -> Self {
        Self::module(constants::GLOBAL_ESCROW_MODULE, 0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    #[must_use]
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Pool coin denomination for a pool id.
#[must_use]
pub fn pool_coin_denom(pool_id: PoolId) -> String {
    format!("pool{}", pool_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_addresses_are_stable_and_distinct() {
        let a = Address::pair_escrow(PairId(1));
        let b = Address::pair_escrow(PairId(1));
        assert_eq!(a, b);
        assert_ne!(a, Address::pair_escrow(PairId(2)));
        assert_ne!(a, Address::pool_reserve(PoolId(1)));
        assert!(a.as_str().starts_with("dex1"));
        assert_eq!(a.as_str().len(), 4 + 40);
    }

    #[test]
    fn coin_display() {
        assert_eq!(format!("{}", Coin::new("denom1", 1_000)), "1000denom1");
        assert!(Coin::zero("denom1").is_zero());
        assert!(Coin::new("denom1", 1).is_positive());
    }

    #[test]
    fn pool_coin_denom_format() {
        assert_eq!(pool_coin_denom(PoolId(3)), "pool3");
    }

    #[test]
    fn coin_serde_roundtrip() {
        let coin = Coin::new("denom2", 340_282_366_920_938_463_463_374_607_431_768_211_455);
        let json = serde_json::to_string(&coin).unwrap();
        let back: Coin = serde_json::from_str(&json).unwrap();
        assert_eq!(coin, back);
    }
}
