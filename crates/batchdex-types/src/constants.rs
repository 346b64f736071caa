//! System-wide constants for the batchdex engine.

/// Maximum number of fractional digits a price may carry.
pub const PRICE_PRECISION: u32 = 18;

/// Largest amount accepted into orders, pools and deposits.
///
/// Stays below `Decimal::MAX` so every amount converts into a decimal.
pub const MAX_AMOUNT: u128 = 10_000_000_000_000_000_000_000_000_000;

/// Pool coins minted to the creator of a new pool.
pub const DEFAULT_INITIAL_POOL_COIN_SUPPLY: u128 = 1_000_000_000_000;

/// Minimum amount of each reserve coin when creating a pool.
pub const DEFAULT_MIN_INITIAL_DEPOSIT_AMOUNT: u128 = 1_000_000;

/// Default upper bound on an order's lifespan, in seconds (one day).
pub const DEFAULT_MAX_ORDER_LIFESPAN_SECS: u64 = 86_400;

/// Bech32-style human readable prefix used for derived module accounts.
pub const ADDRESS_PREFIX: &str = "dex1";

/// Module name hashed into pair escrow addresses.
pub const PAIR_ESCROW_MODULE: &str = "liquidity/PairEscrowAcc";

/// Module name hashed into pool reserve addresses.
pub const POOL_RESERVE_MODULE: &str = "liquidity/PoolReserveAcc";

/// Module name hashed into the deposit/withdraw request escrow address.
pub const GLOBAL_ESCROW_MODULE: &str = "liquidity/GlobalEscrowAcc";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "batchdex";
