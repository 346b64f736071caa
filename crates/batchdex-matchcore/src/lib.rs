//! # batchdex-matchcore
//!
//! **Pure deterministic matching for batchdex.**
//!
//! MatchCore is the compute plane. It takes one pair's orders, arranges
//! them in a price-descending [`OrderBook`] and produces the batch's trades
//! at a uniform clearing price. It has:
//!
//! - **Zero side effects**: no store writes, no balance checks
//! - **Deterministic output**: same book -> same trades, same trade root
//! - **Pool liquidity**: constant-product pools quote synthetic orders at
//!   the book's price levels

pub mod clearing;
pub mod determinism;
pub mod matcher;
pub mod order_group;
pub mod orderbook;
pub mod pool;

pub use clearing::{ClearingResult, clearing_price, compute_clearing};
pub use determinism::{compute_trade_root, verify_trade_root};
pub use matcher::{MatchResult, match_orders};
pub use order_group::{BookOrder, OrderGroup};
pub use orderbook::OrderBook;
pub use pool::{DepositOutcome, PoolState, WithdrawOutcome, deposit_outcome, pool_orders, withdraw_outcome};
