//! Targeted sweeper: the per-invocation batch state machine
//!
//! One `sweep_next_batch` call processes at most one bounded batch for one
//! partition and returns a count for the external scheduling driver. The
//! core assumes at most one active processor per partition, but tolerates
//! brief overlap during failover: deletes are idempotent and the progress
//! marker is compare-and-set monotonic, so an overlapping processor can
//! only cause redundant work, never corruption.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::boundary::SweepBoundaryCalculator;
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::queue::{QueueEntry, SweepQueueStore};
use crate::shard::{ShardAndStrategy, SweepStrategy};
use crate::storage::{
    Cell, DeleteExecutor, DeleteRequest, HostPartitioner, KeyValueService, TableRef, Timestamp,
};

use super::classify::CellClassification;

// =============================================================================
// Invocation Outcome
// =============================================================================

/// What one sweep invocation accomplished, for scheduling heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    /// Queue entries fully handled this cycle (0 when skipped or empty)
    pub entries_processed: usize,

    /// Highest start timestamp covered by the advanced progress marker
    pub last_swept_timestamp: Option<Timestamp>,

    /// Entries still enqueued for the partition after this cycle
    pub entries_remaining: usize,
}

impl SweepOutcome {
    fn skipped(entries_remaining: usize) -> Self {
        Self {
            entries_processed: 0,
            last_swept_timestamp: None,
            entries_remaining,
        }
    }
}

// =============================================================================
// State Machine Phases
// =============================================================================

/// Transition points of one invocation, traced for operability. A cycle
/// aborted by an error stays at its last completed phase; nothing durable
/// beyond completed deletions changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepPhase {
    BoundaryComputed,
    BatchRead,
    VersionsClassified,
    DeletesIssued,
    ProgressAdvanced,
}

// =============================================================================
// Targeted Sweeper
// =============================================================================

/// Processes sweep batches for queue partitions.
pub struct TargetedSweeper {
    config: SweepConfig,
    queue: Arc<dyn SweepQueueStore>,
    kvs: Arc<dyn KeyValueService>,
    partitioner: Arc<dyn HostPartitioner>,
    boundary: SweepBoundaryCalculator,
}

impl TargetedSweeper {
    pub fn new(
        config: SweepConfig,
        queue: Arc<dyn SweepQueueStore>,
        kvs: Arc<dyn KeyValueService>,
        partitioner: Arc<dyn HostPartitioner>,
        boundary: SweepBoundaryCalculator,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            queue,
            kvs,
            partitioner,
            boundary,
        })
    }

    /// Process the next batch for one partition.
    ///
    /// Idempotent per the scheduling driver's contract: re-invoking after
    /// a crash or timeout redoes at most one batch of idempotent deletions
    /// and never re-processes entries behind the progress marker's intent.
    /// Never blocks beyond the underlying storage calls.
    pub fn sweep_next_batch(&self, partition: ShardAndStrategy) -> Result<SweepOutcome> {
        // Idle → BoundaryComputed (skip the cycle when unavailable)
        let boundary = match self.boundary.sweep_boundary() {
            Ok(boundary) => boundary,
            Err(err @ SweepError::BoundaryUnavailable(_)) => {
                debug!(shard = partition.shard, error = %err, "skipping sweep cycle");
                return Ok(SweepOutcome::skipped(self.queue.pending_entries(partition)?));
            }
            Err(err) => return Err(err),
        };
        self.trace(partition, SweepPhase::BoundaryComputed);

        // BoundaryComputed → BatchRead
        let batch = self
            .queue
            .read_batch(partition, boundary, self.config.batch_size)?;
        self.trace(partition, SweepPhase::BatchRead);

        if batch.is_empty() {
            // Everything below the boundary is already handled; record that
            // so a restarted sweeper knows where it stands
            let marker = boundary.saturating_sub(1);
            return match self.advance_progress(partition, marker)? {
                Some(marker) => Ok(SweepOutcome {
                    entries_processed: 0,
                    last_swept_timestamp: Some(marker),
                    entries_remaining: self.queue.pending_entries(partition)?,
                }),
                None => Ok(SweepOutcome::skipped(self.queue.pending_entries(partition)?)),
            };
        }

        // BatchRead → VersionsClassified
        let deletes = self.classify_batch(partition.strategy, &batch, boundary)?;
        self.trace(partition, SweepPhase::VersionsClassified);

        // VersionsClassified → DeletesIssued (abort cycle on failure; the
        // deletes already issued stay issued and are redone as no-ops)
        let mut versions_deleted = 0;
        for (table, requests) in &deletes {
            let executor = DeleteExecutor::new(
                self.kvs.as_ref(),
                self.partitioner.as_ref(),
                self.config.delete_retries,
                self.config.delete_backoff_ms,
                self.config.delete_parallelism,
            );
            versions_deleted += executor.execute(table, requests)?;
        }
        self.trace(partition, SweepPhase::DeletesIssued);

        // DeletesIssued → ProgressAdvanced: queue entries go first, then
        // the marker; a crash in between only costs redundant rereads
        self.queue.delete_processed(&batch)?;

        // A full batch may have split a timestamp's entries in half, so
        // only everything strictly before the last read timestamp is known
        // to be fully handled in that case
        let last_ts = batch[batch.len() - 1].start_timestamp;
        let marker = if batch.len() == self.config.batch_size {
            last_ts.saturating_sub(1)
        } else {
            boundary.saturating_sub(1)
        };

        let advanced = self.advance_progress(partition, marker)?;
        self.trace(partition, SweepPhase::ProgressAdvanced);

        let entries_remaining = self.queue.pending_entries(partition)?;
        match advanced {
            Some(marker) => {
                info!(
                    shard = partition.shard,
                    strategy = ?partition.strategy,
                    entries = batch.len(),
                    versions_deleted,
                    progress = marker,
                    "swept batch"
                );
                Ok(SweepOutcome {
                    entries_processed: batch.len(),
                    last_swept_timestamp: Some(marker),
                    entries_remaining,
                })
            }
            // Another processor owns the partition; report a no-op
            None => Ok(SweepOutcome::skipped(entries_remaining)),
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Fetch retained versions for every cell the batch references and
    /// decide which are obsolete under the partition's strategy.
    fn classify_batch(
        &self,
        strategy: SweepStrategy,
        batch: &[QueueEntry],
        boundary: Timestamp,
    ) -> Result<Vec<(TableRef, Vec<DeleteRequest>)>> {
        // Group referenced cells by table, deduplicating repeat writers
        let mut cells_by_table: HashMap<TableRef, BTreeSet<Cell>> = HashMap::new();
        for entry in batch {
            cells_by_table
                .entry(entry.write.table.clone())
                .or_default()
                .insert(entry.write.cell());
        }

        let mut deletes = Vec::new();
        for (table, cells) in cells_by_table {
            let cells: Vec<Cell> = cells.into_iter().collect();
            let versions = self.kvs.get_all_versions(&table, &cells, boundary)?;

            let mut requests = Vec::new();
            for cell in &cells {
                let cell_versions = match versions.get(cell) {
                    Some(found) => found.as_slice(),
                    // Already swept (crash retry) or never written: the
                    // queue entry is confirmed handled with no deletes
                    None => continue,
                };

                // Only thorough sweep cares whether the survivor is a
                // tombstone, so only then pay for the value read
                let newest_is_tombstone = if strategy == SweepStrategy::Thorough {
                    self.kvs
                        .get(&table, cell, boundary)?
                        .map(|(_, value)| value.is_tombstone())
                        .unwrap_or(false)
                } else {
                    false
                };

                let classification =
                    CellClassification::classify(strategy, cell_versions, newest_is_tombstone);
                requests.extend(classification.obsolete.into_iter().map(|ts| DeleteRequest {
                    cell: cell.clone(),
                    timestamp: ts,
                }));
            }

            if !requests.is_empty() {
                deletes.push((table, requests));
            }
        }
        Ok(deletes)
    }

    // =========================================================================
    // Progress
    // =========================================================================

    /// Advance the marker, treating a rejected regression as evidence that
    /// another processor is active (no-op cycle, not an error).
    fn advance_progress(
        &self,
        partition: ShardAndStrategy,
        marker: Timestamp,
    ) -> Result<Option<Timestamp>> {
        match self.queue.set_progress(partition, marker) {
            Ok(()) => Ok(Some(marker)),
            Err(SweepError::ProgressConflict { attempted, stored }) => {
                warn!(
                    shard = partition.shard,
                    attempted, stored, "progress conflict: another processor is active"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn trace(&self, partition: ShardAndStrategy, phase: SweepPhase) {
        debug!(shard = partition.shard, strategy = ?partition.strategy, ?phase, "sweep transition");
    }
}
