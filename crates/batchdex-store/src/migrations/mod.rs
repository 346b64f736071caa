//! Store schema migrations. Run out-of-band, between blocks.

pub mod v1;
pub mod v2;

pub use v2::{MigrationReport, migrate_store};
