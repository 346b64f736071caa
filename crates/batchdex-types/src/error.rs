//! Error types for the batchdex engine.
//!
//! All errors use the `DEX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Pair / pool errors
//! - 3xx: Deposit / withdraw request errors
//! - 4xx: Ledger errors
//! - 5xx: Matching / arithmetic errors
//! - 6xx: Store / codec errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, Amount, BatchId, OrderId, PairId, PoolId, RequestId};

/// Central error enum for all batchdex operations.
#[derive(Debug, Error)]
pub enum DexError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order does not exist in the store.
    #[error("DEX_ERR_100: Order not found: {pair_id} {order_id}")]
    OrderNotFound { pair_id: PairId, order_id: OrderId },

    /// The order failed validation (bad price, zero amount, etc.).
    #[error("DEX_ERR_101: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Only the orderer may cancel an order.
    #[error("DEX_ERR_102: Address {0} is not the orderer")]
    WrongOrderer(Address),

    /// The order already reached a terminal status.
    #[error("DEX_ERR_103: Order already finished: {0}")]
    OrderAlreadyFinished(OrderId),

    /// Orders cannot be cancelled in the batch they were submitted in.
    #[error("DEX_ERR_104: Order {order_id} cannot be cancelled in its submission {batch_id}")]
    SameBatch { order_id: OrderId, batch_id: BatchId },

    /// Requested lifespan exceeds the configured maximum.
    #[error("DEX_ERR_105: Order lifespan {requested_secs}s exceeds maximum {max_secs}s")]
    LifespanTooLong { requested_secs: u64, max_secs: u64 },

    // =================================================================
    // Pair / Pool Errors (2xx)
    // =================================================================
    /// The requested pair does not exist.
    #[error("DEX_ERR_200: Pair not found: {0}")]
    PairNotFound(PairId),

    /// A pair with the same denominations already exists.
    #[error("DEX_ERR_201: Pair already exists for {x_denom}/{y_denom}")]
    PairAlreadyExists { x_denom: String, y_denom: String },

    /// Pair denominations are invalid.
    #[error("DEX_ERR_202: Invalid pair denominations: {reason}")]
    InvalidDenoms { reason: String },

    /// The requested pool does not exist.
    #[error("DEX_ERR_203: Pool not found: {0}")]
    PoolNotFound(PoolId),

    /// The pair already has an enabled pool.
    #[error("DEX_ERR_204: Pair {0} already has an active pool")]
    PoolAlreadyExists(PairId),

    /// The pool has been disabled (all reserves withdrawn).
    #[error("DEX_ERR_205: Pool is disabled: {0}")]
    PoolDisabled(PoolId),

    /// Initial deposit does not meet the minimum.
    #[error("DEX_ERR_206: Insufficient initial deposit: need at least {minimum} of each coin")]
    InsufficientInitialDeposit { minimum: Amount },

    // =================================================================
    // Request Errors (3xx)
    // =================================================================
    /// The requested deposit request does not exist.
    #[error("DEX_ERR_300: Deposit request not found: {pool_id} {request_id}")]
    DepositRequestNotFound {
        pool_id: PoolId,
        request_id: RequestId,
    },

    /// The requested withdraw request does not exist.
    #[error("DEX_ERR_301: Withdraw request not found: {pool_id} {request_id}")]
    WithdrawRequestNotFound {
        pool_id: PoolId,
        request_id: RequestId,
    },

    /// The request coins don't match the pool's denominations or are zero.
    #[error("DEX_ERR_302: Invalid request coins: {reason}")]
    InvalidRequestCoins { reason: String },

    // =================================================================
    // Ledger Errors (4xx)
    // =================================================================
    /// Not enough balance to perform a transfer or burn.
    #[error("DEX_ERR_400: Insufficient funds in {address}: need {needed}{denom}, have {available}{denom}")]
    InsufficientFunds {
        address: Address,
        denom: String,
        needed: Amount,
        available: Amount,
    },

    /// A ledger operation would overflow a balance or the supply.
    #[error("DEX_ERR_401: Ledger overflow for {denom}")]
    LedgerOverflow { denom: String },

    /// A ledger backend refused the operation.
    #[error("DEX_ERR_402: Ledger rejected operation: {reason}")]
    LedgerRejected { reason: String },

    /// Balances no longer add up to the recorded supply of a denomination.
    #[error("DEX_ERR_403: Supply invariant violated: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Matching / Arithmetic Errors (5xx)
    // =================================================================
    /// The matching procedure encountered an error.
    #[error("DEX_ERR_500: Matching failed: {reason}")]
    MatchingFailed { reason: String },

    /// A checked arithmetic operation overflowed or divided by zero.
    #[error("DEX_ERR_501: Arithmetic error: {reason}")]
    Arithmetic { reason: String },

    /// An amount exceeds the largest amount the engine can price.
    #[error("DEX_ERR_502: Amount {amount} exceeds maximum {max}")]
    AmountTooLarge { amount: Amount, max: Amount },

    // =================================================================
    // Store / Codec Errors (6xx)
    // =================================================================
    /// A key did not have the expected layout.
    #[error("DEX_ERR_600: Malformed store key: {reason}")]
    MalformedKey { reason: String },

    /// Encoding or decoding a stored value failed.
    #[error("DEX_ERR_601: Codec error: {0}")]
    Codec(String),

    /// The storage backend failed.
    #[error("DEX_ERR_602: Store error: {0}")]
    Store(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DEX_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("DEX_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk).
    #[error("DEX_ERR_903: I/O error: {0}")]
    Io(String),
}

impl DexError {
    /// Shorthand for [`DexError::Arithmetic`].
    pub fn arithmetic(reason: impl Into<String>) -> Self {
        Self::Arithmetic {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DexError>;

impl From<std::io::Error> for DexError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}
