//! # batchdex-store
//!
//! Persistence layer of the batchdex engine.
//!
//! - [`kv`]: the [`KvStore`] trait and the in-memory [`MemStore`]
//! - [`keys`]: the binary key layout and its parsers
//! - [`codec`]: value encoding
//! - [`migrations`]: schema migrations between store versions

pub mod codec;
pub mod keys;
pub mod kv;
pub mod migrations;

pub use kv::{KvStore, MemStore};
