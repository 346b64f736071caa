//! # batchdex-types
//!
//! Shared types, errors, and configuration for the **batchdex** engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PairId`], [`PoolId`], [`OrderId`], [`RequestId`], [`BatchId`], [`TradeId`]
//! - **Accounts and coins**: [`Address`], [`Coin`], [`Amount`]
//! - **Order model**: [`Order`], [`SwapDirection`], [`OrderStatus`]
//! - **Request model**: [`DepositRequest`], [`WithdrawRequest`], [`RequestStatus`]
//! - **Liquidity model**: [`Pair`], [`Pool`]
//! - **Trade model**: [`Trade`]
//! - **Block metadata**: [`BlockContext`]
//! - **Configuration**: [`Params`]
//! - **Errors**: [`DexError`] with `DEX_ERR_` prefix codes
//! - **Math**: checked integer/decimal helpers in [`math`]
//! - **Constants**: system-wide limits and defaults

pub mod block;
pub mod coin;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod math;
pub mod order;
pub mod pair;
pub mod request;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use batchdex_types::{Order, SwapDirection, Pair, Pool, ...};

pub use block::*;
pub use coin::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use pair::*;
pub use request::*;
pub use trade::*;

// Constants and math helpers are accessed via their module path
// (not re-exported to avoid name collisions).
