//! Commit-path queue writer
//!
//! Facade used by the transaction commit path: assigns each written cell
//! to its partition and records it in the sweep queue. Fire-and-forget
//! relative to the commit itself - a failure here is returned for the
//! caller to retry (enqueue is idempotent) but never blocks or reorders
//! the transaction's own writes.

use std::sync::Arc;

use tracing::debug;

use crate::codec::validate_timestamp;
use crate::error::Result;
use crate::shard::{ShardAndStrategy, ShardAssigner, StrategyRegistry};
use crate::storage::{Timestamp, WriteReference};

use super::entry::QueueEntry;
use super::store::SweepQueueStore;

/// Writes commit-time sweep queue entries.
pub struct SweepQueueWriter {
    assigner: ShardAssigner,
    strategies: StrategyRegistry,
    queue: Arc<dyn SweepQueueStore>,
}

impl SweepQueueWriter {
    pub fn new(
        assigner: ShardAssigner,
        strategies: StrategyRegistry,
        queue: Arc<dyn SweepQueueStore>,
    ) -> Self {
        Self {
            assigner,
            strategies,
            queue,
        }
    }

    /// Record every cell written by a transaction, returning how many
    /// entries were enqueued.
    ///
    /// Writes landing in the same partition share one enqueue call; any
    /// interleaving with other transactions' enqueues is acceptable since
    /// entries are keyed by the unique start timestamp.
    pub fn enqueue_writes(&self, start_ts: Timestamp, writes: &[WriteReference]) -> Result<usize> {
        validate_timestamp(start_ts)?;

        let entries: Vec<QueueEntry> = writes
            .iter()
            .map(|write| {
                let partition = ShardAndStrategy::new(
                    self.assigner.shard_for(write),
                    self.strategies.strategy_for(&write.table),
                );
                QueueEntry::new(partition, start_ts, write.clone())
            })
            .collect();

        self.queue.enqueue(&entries)?;

        debug!(start_ts, entries = entries.len(), "enqueued sweep entries");
        Ok(entries.len())
    }
}
