//! # batchdex-keeper
//!
//! State transitions of the batchdex liquidity module.
//!
//! ## Architecture
//!
//! The [`Keeper`] owns a [`batchdex_store::KvStore`], a [`Ledger`] and the
//! module [`batchdex_types::Params`]. Messages create pairs, pools, orders
//! and requests; once per block the batch pipeline:
//! 1. Matches every pair's book (user orders plus pool liquidity)
//! 2. Expires orders past their expiration time
//! 3. Executes pending deposit requests
//! 4. Executes pending withdraw requests
//!
//! Finished records are purged by the cleanup pass at the start of the
//! following block.

pub mod abci;
pub mod batch;
pub mod keeper;
pub mod ledger;
pub mod matching;
pub mod msgs;
pub mod pool;
pub mod queries;

pub use batch::{BatchReport, CleanupReport};
pub use keeper::Keeper;
pub use ledger::{BankLedger, Ledger};
