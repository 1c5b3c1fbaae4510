//! Key-value service interface and in-memory implementation
//!
//! The replicated storage engine itself is an external collaborator; the
//! sweep core consumes it through this narrow trait. The in-memory
//! implementation backs the tests and doubles as the reference semantics
//! for what the real backend must provide.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::{Result, SweepError};

use super::types::{Cell, CellValue, TableRef, Timestamp};

// =============================================================================
// Key-Value Service Trait
// =============================================================================

/// Narrow interface onto the replicated MVCC storage backend.
///
/// ## Semantics the sweep core relies on
/// - `get` is a snapshot read: the latest version strictly below the bound.
/// - `get_all_versions` returns version timestamps strictly below the
///   bound, ascending per cell.
/// - `delete` removes exactly one version and is idempotent: deleting an
///   absent version is a no-op success. This is what makes a sweep cycle
///   safely retryable after a crash.
pub trait KeyValueService: Send + Sync {
    /// Latest version of `cell` with timestamp strictly below `ts_bound`
    fn get(&self, table: &TableRef, cell: &Cell, ts_bound: Timestamp)
        -> Result<Option<(Timestamp, CellValue)>>;

    /// All version timestamps strictly below `ts_bound`, ascending per cell
    fn get_all_versions(
        &self,
        table: &TableRef,
        cells: &[Cell],
        ts_bound: Timestamp,
    ) -> Result<HashMap<Cell, Vec<Timestamp>>>;

    /// Write one version
    fn put(&self, table: &TableRef, cell: &Cell, ts: Timestamp, value: CellValue) -> Result<()>;

    /// Remove the version at exactly `ts` (no-op success when absent)
    fn delete(&self, table: &TableRef, cell: &Cell, ts: Timestamp) -> Result<()>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// Per-cell version chain: timestamp → payload
type VersionChain = BTreeMap<Timestamp, CellValue>;

/// In-memory versioned key-value service
///
/// ## Concurrency:
/// - `tables`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `delete_faults`: Atomic countdown (lock-free) for fault injection
/// - All methods use `&self` (no exclusive access needed)
#[derive(Default)]
pub struct InMemoryKvs {
    /// table → cell → version chain
    tables: RwLock<HashMap<TableRef, BTreeMap<Cell, VersionChain>>>,

    /// Remaining deletes to fail with a transient error (fault injection
    /// for crash/retry tests)
    delete_faults: AtomicUsize,
}

impl InMemoryKvs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` delete calls with `StorageTransient`
    pub fn fail_next_deletes(&self, n: usize) {
        self.delete_faults.store(n, Ordering::SeqCst);
    }

    /// Number of versions currently stored for a cell (test observability)
    pub fn version_count(&self, table: &TableRef, cell: &Cell) -> usize {
        let tables = self.tables.read();
        tables
            .get(table)
            .and_then(|t| t.get(cell))
            .map(|chain| chain.len())
            .unwrap_or(0)
    }

    /// All version timestamps for a cell, ascending (test observability)
    pub fn version_timestamps(&self, table: &TableRef, cell: &Cell) -> Vec<Timestamp> {
        let tables = self.tables.read();
        tables
            .get(table)
            .and_then(|t| t.get(cell))
            .map(|chain| chain.keys().copied().collect())
            .unwrap_or_default()
    }

    fn take_delete_fault(&self) -> bool {
        // Decrement-if-positive without a lock
        loop {
            let current = self.delete_faults.load(Ordering::SeqCst);
            if current == 0 {
                return false;
            }
            if self
                .delete_faults
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }
}

impl KeyValueService for InMemoryKvs {
    fn get(
        &self,
        table: &TableRef,
        cell: &Cell,
        ts_bound: Timestamp,
    ) -> Result<Option<(Timestamp, CellValue)>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .and_then(|t| t.get(cell))
            .and_then(|chain| chain.range(..ts_bound).next_back())
            .map(|(ts, value)| (*ts, value.clone())))
    }

    fn get_all_versions(
        &self,
        table: &TableRef,
        cells: &[Cell],
        ts_bound: Timestamp,
    ) -> Result<HashMap<Cell, Vec<Timestamp>>> {
        let tables = self.tables.read();
        let table_data = match tables.get(table) {
            Some(data) => data,
            None => return Ok(HashMap::new()),
        };

        let mut result = HashMap::new();
        for cell in cells {
            if let Some(chain) = table_data.get(cell) {
                let versions: Vec<Timestamp> = chain.range(..ts_bound).map(|(ts, _)| *ts).collect();
                if !versions.is_empty() {
                    result.insert(cell.clone(), versions);
                }
            }
        }
        Ok(result)
    }

    fn put(&self, table: &TableRef, cell: &Cell, ts: Timestamp, value: CellValue) -> Result<()> {
        let mut tables = self.tables.write();
        tables
            .entry(table.clone())
            .or_default()
            .entry(cell.clone())
            .or_default()
            .insert(ts, value);
        Ok(())
    }

    fn delete(&self, table: &TableRef, cell: &Cell, ts: Timestamp) -> Result<()> {
        if self.take_delete_fault() {
            return Err(SweepError::StorageTransient(format!(
                "injected delete fault for {}@{}",
                table, ts
            )));
        }

        let mut tables = self.tables.write();
        if let Some(table_data) = tables.get_mut(table) {
            if let Some(chain) = table_data.get_mut(cell) {
                chain.remove(&ts);
                if chain.is_empty() {
                    table_data.remove(cell);
                }
            }
        }
        // Absent version: idempotent no-op success
        Ok(())
    }
}
