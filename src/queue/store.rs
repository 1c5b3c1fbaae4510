//! Sweep queue store interface and in-memory implementation
//!
//! The store models externally-owned durable records: queue cells keyed by
//! the ticket codec's (row, column) layout, and one progress record per
//! partition. All mutations are idempotent and the progress marker is
//! compare-and-set guarded, which is what keeps the subsystem correct
//! during the brief multi-writer overlap window of a failover.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::TicketCodec;
use crate::error::{Result, SweepError};
use crate::shard::ShardAndStrategy;
use crate::storage::{Timestamp, WriteReference};

use super::entry::QueueEntry;

// =============================================================================
// Store Trait
// =============================================================================

/// Durable record of pending sweep work.
///
/// ## Contract
/// - `enqueue` is idempotent under retry: re-enqueueing the same
///   `(partition, start_timestamp, cell)` overwrites, never duplicates.
/// - `read_batch` returns entries in ascending `start_timestamp` order.
/// - `set_progress` rejects regressions at the store boundary, not just by
///   caller discipline.
pub trait SweepQueueStore: Send + Sync {
    /// Record pending writes (best-effort; caller may retry on transient
    /// failure)
    fn enqueue(&self, entries: &[QueueEntry]) -> Result<()>;

    /// Entries of one partition with `start_timestamp < upper_exclusive`,
    /// ascending, at most `max_entries`
    fn read_batch(
        &self,
        partition: ShardAndStrategy,
        upper_exclusive: Timestamp,
        max_entries: usize,
    ) -> Result<Vec<QueueEntry>>;

    /// Remove entries whose obsolete versions are confirmed swept
    fn delete_processed(&self, entries: &[QueueEntry]) -> Result<()>;

    /// Current progress marker, if the partition was ever swept
    fn get_progress(&self, partition: ShardAndStrategy) -> Result<Option<Timestamp>>;

    /// Advance the progress marker (monotonic; equal value is an
    /// idempotent no-op, lower is rejected with `ProgressConflict`)
    fn set_progress(&self, partition: ShardAndStrategy, ts: Timestamp) -> Result<()>;

    /// Entries still enqueued for a partition (scheduling heuristic)
    fn pending_entries(&self, partition: ShardAndStrategy) -> Result<usize>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory sweep queue over byte-ordered maps.
///
/// Rows and columns are the exact persisted byte keys, so iteration order
/// here is the same lexicographic order a real backend scan would produce;
/// ascending-timestamp reads fall out of the codec's key layout rather
/// than any sorting done in this store.
pub struct InMemorySweepQueue {
    codec: TicketCodec,

    /// row key → column key → serialized write references for that
    /// (partition, ts); values are the exact bytes a real backend would
    /// hold
    rows: RwLock<BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Vec<u8>>>>,

    /// partition → progress marker
    progress: RwLock<HashMap<ShardAndStrategy, Timestamp>>,
}

/// Serialize the write set stored under one queue cell
fn encode_writes(writes: &BTreeSet<WriteReference>) -> Result<Vec<u8>> {
    bincode::serialize(writes).map_err(|e| SweepError::Serialization(e.to_string()))
}

/// Inverse of [`encode_writes`]
fn decode_writes(bytes: &[u8]) -> Result<BTreeSet<WriteReference>> {
    bincode::deserialize(bytes).map_err(|e| SweepError::Serialization(e.to_string()))
}

impl InMemorySweepQueue {
    pub fn new(ticket_span: u64) -> Result<Self> {
        Ok(Self {
            codec: TicketCodec::new(ticket_span)?,
            rows: RwLock::new(BTreeMap::new()),
            progress: RwLock::new(HashMap::new()),
        })
    }

    /// Byte range covering every row of one partition
    fn partition_row_range(&self, partition: ShardAndStrategy) -> (Vec<u8>, Vec<u8>) {
        (
            self.codec.row_key(partition, 0),
            self.codec.row_key(partition, u64::MAX),
        )
    }
}

impl SweepQueueStore for InMemorySweepQueue {
    fn enqueue(&self, entries: &[QueueEntry]) -> Result<()> {
        let mut rows = self.rows.write();
        for entry in entries {
            let (row, column) = self
                .codec
                .encode_queue_keys(entry.partition, entry.start_timestamp)?;
            let slot = rows.entry(row).or_default().entry(column).or_default();
            // Set insert makes re-enqueue of the same write an overwrite,
            // never a duplicate
            let mut writes = if slot.is_empty() {
                BTreeSet::new()
            } else {
                decode_writes(slot)?
            };
            writes.insert(entry.write.clone());
            *slot = encode_writes(&writes)?;
        }
        Ok(())
    }

    fn read_batch(
        &self,
        partition: ShardAndStrategy,
        upper_exclusive: Timestamp,
        max_entries: usize,
    ) -> Result<Vec<QueueEntry>> {
        let rows = self.rows.read();
        let (start, end) = self.partition_row_range(partition);

        let mut batch = Vec::new();
        'rows: for (row, columns) in rows.range(start..=end) {
            for (column, value) in columns {
                let (_, ts) = self.codec.decode_queue_keys(row, column)?;
                if ts >= upper_exclusive {
                    // Keys scan in ascending timestamp order, so nothing
                    // later in this partition can be below the bound
                    break 'rows;
                }
                for write in decode_writes(value)? {
                    if batch.len() >= max_entries {
                        break 'rows;
                    }
                    batch.push(QueueEntry::new(partition, ts, write));
                }
            }
        }

        debug!(
            shard = partition.shard,
            strategy = ?partition.strategy,
            upper_exclusive,
            entries = batch.len(),
            "read sweep batch"
        );
        Ok(batch)
    }

    fn delete_processed(&self, entries: &[QueueEntry]) -> Result<()> {
        let mut rows = self.rows.write();
        for entry in entries {
            let (row, column) = self
                .codec
                .encode_queue_keys(entry.partition, entry.start_timestamp)?;
            if let Some(columns) = rows.get_mut(&row) {
                let now_empty = match columns.get_mut(&column) {
                    Some(value) => {
                        let mut writes = decode_writes(value)?;
                        writes.remove(&entry.write);
                        if writes.is_empty() {
                            true
                        } else {
                            *value = encode_writes(&writes)?;
                            false
                        }
                    }
                    None => false,
                };
                if now_empty {
                    columns.remove(&column);
                }
                if columns.is_empty() {
                    rows.remove(&row);
                }
            }
        }
        Ok(())
    }

    fn get_progress(&self, partition: ShardAndStrategy) -> Result<Option<Timestamp>> {
        Ok(self.progress.read().get(&partition).copied())
    }

    fn set_progress(&self, partition: ShardAndStrategy, ts: Timestamp) -> Result<()> {
        // Compare-and-set under the write lock: the check and the store are
        // one atomic step, so an overlapping writer cannot regress us
        let mut progress = self.progress.write();
        match progress.get(&partition) {
            Some(&stored) if ts < stored => Err(SweepError::ProgressConflict {
                attempted: ts,
                stored,
            }),
            _ => {
                progress.insert(partition, ts);
                Ok(())
            }
        }
    }

    fn pending_entries(&self, partition: ShardAndStrategy) -> Result<usize> {
        let rows = self.rows.read();
        let (start, end) = self.partition_row_range(partition);
        let mut count = 0;
        for (_, columns) in rows.range(start..=end) {
            for value in columns.values() {
                count += decode_writes(value)?.len();
            }
        }
        Ok(count)
    }
}
