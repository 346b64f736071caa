//! Committed block metadata handed to every state transition.
//!
//! The engine never reads the wall clock. The only notion of time is the
//! committed block time carried by [`BlockContext`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Height and time of the block being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockContext {
    #[must_use]
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Context of the following block, `block_time_secs` later.
    #[must_use]
    pub fn next(self, block_time_secs: i64) -> Self {
        Self {
            height: self.height + 1,
            time: self.time + chrono::Duration::seconds(block_time_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn next_block_advances_height_and_time() {
        let t0 = Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 0).unwrap();
        let ctx = BlockContext::new(10, t0).next(5);
        assert_eq!(ctx.height, 11);
        assert_eq!(ctx.time, Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 5).unwrap());
    }
}
