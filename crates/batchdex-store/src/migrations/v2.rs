//! Migration from schema version 1 to 2.
//!
//! Version 2 gives every order an expiration time and adds that time to the
//! orderer index key. Orders that predate the migration are treated as if
//! they had been placed at the migration block with the given lifespan.
//! Index keys take the expiration of the order record they point to.

use std::time::Duration;

use batchdex_types::{DexError, Order, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::v1;
use crate::codec;
use crate::keys::{self, ORDER_INDEX_KEY_PREFIX, ORDER_KEY_PREFIX};
use crate::kv::KvStore;

/// Counts of rewritten entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub orders_rewritten: usize,
    pub index_keys_rewritten: usize,
}

/// Rewrite every v1 order record and orderer index key in `store`.
///
/// Entries already in the v2 layout are left untouched, so running the
/// migration twice is harmless.
pub fn migrate_store<S: KvStore>(
    store: &mut S,
    block_time: DateTime<Utc>,
    order_lifespan: Duration,
) -> Result<MigrationReport> {
    let lifespan = chrono::Duration::from_std(order_lifespan)
        .map_err(|e| DexError::Configuration(format!("order lifespan out of range: {e}")))?;
    let expire_at = block_time
        .checked_add_signed(lifespan)
        .ok_or_else(|| DexError::arithmetic("expiration time overflows"))?;

    let mut report = MigrationReport::default();

    for (key, value) in store.iter_prefix(&[ORDER_KEY_PREFIX])? {
        if codec::decode::<Order>(&value).is_ok() {
            continue;
        }
        let legacy: v1::OrderV1 = codec::decode(&value)?;
        let order = legacy.into_v2(expire_at);
        store.set(key, codec::encode(&order)?)?;
        report.orders_rewritten += 1;
    }

    for (old_key, value) in store.iter_prefix(&[ORDER_INDEX_KEY_PREFIX])? {
        let Some((orderer, pair_id, order_id)) = v1::parse_order_index_key(&old_key)? else {
            continue;
        };
        // the record is v2 by now and its expiration is authoritative
        let order_expire_at = match store.get(&keys::order_key(pair_id, order_id))? {
            Some(record) => codec::decode::<Order>(&record)?.expire_at,
            None => expire_at,
        };
        let new_key = keys::order_index_key(&orderer, order_expire_at, pair_id, order_id)?;
        debug!(%orderer, %pair_id, %order_id, "re-keying order index entry");
        store.set(new_key, value)?;
        store.delete(&old_key)?;
        report.index_keys_rewritten += 1;
    }

    info!(
        orders = report.orders_rewritten,
        index_keys = report.index_keys_rewritten,
        %expire_at,
        "store migrated to v2"
    );
    Ok(report)
}
