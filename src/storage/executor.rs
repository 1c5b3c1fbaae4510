//! Batched delete fan-out across storage hosts
//!
//! Version deletions are partitioned by storage-node ownership and issued
//! in parallel, with per-host retry on transient failures and
//! cancel-on-first-failure across the whole batch: once any host's retries
//! exhaust, the remaining workers stop issuing new deletes and the batch
//! reports the first error. Deletes already issued are not rolled back -
//! they are idempotent, so a retried cycle simply re-issues them as no-ops.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Result, SweepError};

use super::kvs::KeyValueService;
use super::types::{Cell, TableRef, Timestamp};

// =============================================================================
// Host Partitioning
// =============================================================================

/// Identifier of a storage node
pub type HostId = u32;

/// Maps a cell to the storage node that owns it
pub trait HostPartitioner: Send + Sync {
    fn host_for(&self, table: &TableRef, cell: &Cell) -> HostId;
}

/// Everything on one host (single-node deployments and tests)
#[derive(Debug, Default)]
pub struct SingleHostPartitioner;

impl HostPartitioner for SingleHostPartitioner {
    fn host_for(&self, _table: &TableRef, _cell: &Cell) -> HostId {
        0
    }
}

/// Row-hash partitioning across a fixed host count
#[derive(Debug)]
pub struct ModuloHostPartitioner {
    num_hosts: u32,
}

impl ModuloHostPartitioner {
    pub fn new(num_hosts: u32) -> Self {
        Self {
            num_hosts: num_hosts.max(1),
        }
    }
}

impl HostPartitioner for ModuloHostPartitioner {
    fn host_for(&self, _table: &TableRef, cell: &Cell) -> HostId {
        crc32fast::hash(&cell.row) % self.num_hosts
    }
}

// =============================================================================
// Delete Executor
// =============================================================================

/// One version to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub cell: Cell,
    pub timestamp: Timestamp,
}

/// Issues a batch of version deletions with bounded parallelism.
pub struct DeleteExecutor<'a> {
    kvs: &'a dyn KeyValueService,
    partitioner: &'a dyn HostPartitioner,
    retries: usize,
    backoff_ms: u64,
    parallelism: usize,
}

impl<'a> DeleteExecutor<'a> {
    pub fn new(
        kvs: &'a dyn KeyValueService,
        partitioner: &'a dyn HostPartitioner,
        retries: usize,
        backoff_ms: u64,
        parallelism: usize,
    ) -> Self {
        Self {
            kvs,
            partitioner,
            retries,
            backoff_ms,
            parallelism: parallelism.max(1),
        }
    }

    /// Issue all deletes, returning how many were confirmed removed (or
    /// confirmed already absent).
    ///
    /// Fails with the first host's terminal error; any deletes issued
    /// before cancellation remain issued.
    pub fn execute(&self, table: &TableRef, deletes: &[DeleteRequest]) -> Result<usize> {
        if deletes.is_empty() {
            return Ok(0);
        }

        // Group by owning host, preserving input order within each group
        let mut groups: Vec<(HostId, Vec<DeleteRequest>)> = Vec::new();
        for request in deletes {
            let host = self.partitioner.host_for(table, &request.cell);
            match groups.iter_mut().find(|(h, _)| *h == host) {
                Some((_, group)) => group.push(request.clone()),
                None => groups.push((host, vec![request.clone()])),
            }
        }

        let next_group = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);
        let deleted = AtomicUsize::new(0);
        let first_error: Mutex<Option<SweepError>> = Mutex::new(None);

        let workers = self.parallelism.min(groups.len());
        let groups = &groups;
        let next_group = &next_group;
        let cancelled = &cancelled;
        let deleted = &deleted;
        let first_error = &first_error;

        crossbeam::thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(move |_| {
                    loop {
                        if cancelled.load(Ordering::SeqCst) {
                            break;
                        }
                        let idx = next_group.fetch_add(1, Ordering::SeqCst);
                        if idx >= groups.len() {
                            break;
                        }
                        let (host, group) = &groups[idx];
                        for request in group {
                            if cancelled.load(Ordering::SeqCst) {
                                break;
                            }
                            match self.delete_with_retry(table, *host, request) {
                                Ok(()) => {
                                    deleted.fetch_add(1, Ordering::SeqCst);
                                }
                                Err(err) => {
                                    // First failure cancels the rest of the batch
                                    cancelled.store(true, Ordering::SeqCst);
                                    let mut slot = first_error.lock();
                                    if slot.is_none() {
                                        *slot = Some(err);
                                    }
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        })
        .map_err(|_| SweepError::Storage("delete worker panicked".to_string()))?;

        let result = match first_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(deleted.load(Ordering::SeqCst)),
        };
        result
    }

    /// One delete with per-host retry on transient failures
    fn delete_with_retry(&self, table: &TableRef, host: HostId, request: &DeleteRequest) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.kvs.delete(table, &request.cell, request.timestamp) {
                Ok(()) => return Ok(()),
                Err(err @ SweepError::StorageTransient(_)) if attempt < self.retries => {
                    warn!(
                        host,
                        attempt,
                        timestamp = request.timestamp,
                        error = %err,
                        "transient delete failure, retrying"
                    );
                    thread::sleep(Duration::from_millis(self.backoff_ms << attempt));
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
