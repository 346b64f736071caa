//! Module parameters for the batchdex engine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Amount, DexError, Result, constants};

/// Parameters of the liquidity module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Pool coins minted to the creator of a pool.
    pub initial_pool_coin_supply: Amount,
    /// Minimum amount of each reserve coin when creating a pool.
    pub min_initial_deposit_amount: Amount,
    /// Upper bound on the lifespan of a limit order.
    #[serde(with = "duration_secs")]
    pub max_order_lifespan: Duration,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            initial_pool_coin_supply: constants::DEFAULT_INITIAL_POOL_COIN_SUPPLY,
            min_initial_deposit_amount: constants::DEFAULT_MIN_INITIAL_DEPOSIT_AMOUNT,
            max_order_lifespan: Duration::from_secs(constants::DEFAULT_MAX_ORDER_LIFESPAN_SECS),
        }
    }
}

impl Params {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.initial_pool_coin_supply == 0 {
            return Err(DexError::Configuration(
                "initial_pool_coin_supply must be positive".into(),
            ));
        }
        if self.min_initial_deposit_amount == 0 {
            return Err(DexError::Configuration(
                "min_initial_deposit_amount must be positive".into(),
            ));
        }
        if self.max_order_lifespan.is_zero() {
            return Err(DexError::Configuration(
                "max_order_lifespan must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate parameters from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| DexError::Configuration(format!("invalid params: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
