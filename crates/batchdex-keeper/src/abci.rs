//! Block lifecycle hooks.

use batchdex_store::KvStore;
use batchdex_types::BlockContext;
use tracing::debug;

use crate::batch::{BatchReport, CleanupReport};
use crate::keeper::Keeper;
use crate::ledger::Ledger;

/// Start of a block: purge records finished in earlier blocks.
pub fn begin_block<S: KvStore, L: Ledger>(keeper: &mut Keeper<S, L>, ctx: &BlockContext) -> CleanupReport {
    let report = keeper.delete_outdated_requests();
    debug!(height = ctx.height, deleted = report.total(), "outdated records deleted");
    report
}

/// End of a block: run the batch.
///
/// # Panics
///
/// Panics when the batch fails; see [`Keeper::execute_requests`].
pub fn end_block<S: KvStore, L: Ledger>(keeper: &mut Keeper<S, L>, ctx: &BlockContext) -> BatchReport {
    keeper.execute_requests(ctx)
}
