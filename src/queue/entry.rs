//! Queue entry definitions

use serde::{Deserialize, Serialize};

use crate::shard::ShardAndStrategy;
use crate::storage::{Timestamp, WriteReference};

/// One pending write awaiting sweep
///
/// Created exactly once at commit time for every written cell, never
/// mutated, and deleted once the batch processor confirms the cell's
/// obsolete versions are removed. Never moves between partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Partition this entry belongs to, fixed at enqueue
    pub partition: ShardAndStrategy,

    /// Start timestamp of the writing transaction
    pub start_timestamp: Timestamp,

    /// Identity of the written cell (including the tombstone flag)
    pub write: WriteReference,
}

impl QueueEntry {
    pub fn new(partition: ShardAndStrategy, start_timestamp: Timestamp, write: WriteReference) -> Self {
        Self {
            partition,
            start_timestamp,
            write,
        }
    }
}
