//! Shard Assignment Module
//!
//! Deterministic mapping from a written cell's identity to a sweep queue
//! partition.
//!
//! ## Responsibilities
//! - Stable hash of the owning row identity → shard index
//! - Per-table retention strategy lookup (fixed at configuration time)
//! - `(shard, strategy)` partition identity used by the queue and sweeper
//!
//! The mapping is a pure function: identical inputs always produce the
//! identical shard for the life of a given `num_shards`. It is consulted
//! both when enqueuing at commit and when a sweeper later addresses its
//! partition, so the two sides always agree on ownership.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};
use crate::storage::{TableRef, WriteReference};

// =============================================================================
// Sweep Strategy
// =============================================================================

/// Retention policy for a table, chosen once at configuration time and
/// immutable for the table's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SweepStrategy {
    /// Retain the version visible at exactly the sweep boundary, even when
    /// a newer version exists above the boundary. Required for tables that
    /// support point-in-time historical reads.
    Conservative,

    /// No historical-read guarantee; only the latest version below the
    /// boundary need survive, and a sole surviving tombstone may be
    /// removed outright.
    Thorough,
}

impl SweepStrategy {
    /// Stable single-byte encoding used in persisted row keys
    pub fn as_byte(self) -> u8 {
        match self {
            SweepStrategy::Conservative => 0,
            SweepStrategy::Thorough => 1,
        }
    }

    /// Inverse of [`as_byte`](Self::as_byte)
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(SweepStrategy::Conservative),
            1 => Ok(SweepStrategy::Thorough),
            other => Err(SweepError::MalformedEncoding(format!(
                "unknown sweep strategy byte: 0x{:02x}",
                other
            ))),
        }
    }
}

// =============================================================================
// Shard + Strategy Partition
// =============================================================================

/// The unit of independent, parallelizable sweep progress.
///
/// Entries are never moved between partitions once enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardAndStrategy {
    /// Shard index in `[0, num_shards)`
    pub shard: u16,

    /// Retention strategy of the tables feeding this partition
    pub strategy: SweepStrategy,
}

impl ShardAndStrategy {
    pub fn new(shard: u16, strategy: SweepStrategy) -> Self {
        Self { shard, strategy }
    }

    /// Convenience constructor for conservative partitions
    pub fn conservative(shard: u16) -> Self {
        Self::new(shard, SweepStrategy::Conservative)
    }

    /// Convenience constructor for thorough partitions
    pub fn thorough(shard: u16) -> Self {
        Self::new(shard, SweepStrategy::Thorough)
    }
}

// =============================================================================
// Shard Assigner
// =============================================================================

/// Assigns writes to shards by stable hash of their row identity.
///
/// Uses CRC32 over `table ++ 0x00 ++ row`: cheap, and stable across
/// processes and restarts, which is what correctness requires (the commit
/// path and the sweeper must compute the same shard for the same write).
#[derive(Debug, Clone)]
pub struct ShardAssigner {
    num_shards: u16,
}

impl ShardAssigner {
    pub fn new(num_shards: u16) -> Result<Self> {
        if num_shards == 0 {
            return Err(SweepError::Config("num_shards must be at least 1".to_string()));
        }
        Ok(Self { num_shards })
    }

    /// Shard index for a write, in `[0, num_shards)`
    pub fn shard_for(&self, write: &WriteReference) -> u16 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(write.table.as_bytes());
        // Separator prevents (table="ab", row="c") colliding with ("a", "bc")
        hasher.update(&[0x00]);
        hasher.update(&write.row);
        (hasher.finalize() % u32::from(self.num_shards)) as u16
    }

    pub fn num_shards(&self) -> u16 {
        self.num_shards
    }
}

// =============================================================================
// Strategy Registry
// =============================================================================

/// Per-table strategy lookup, fixed at construction.
///
/// Unregistered tables default to `Conservative` - the direction that can
/// never violate a historical-read guarantee.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<TableRef, SweepStrategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from explicit table → strategy pairs
    pub fn from_tables(tables: impl IntoIterator<Item = (TableRef, SweepStrategy)>) -> Self {
        Self {
            strategies: tables.into_iter().collect(),
        }
    }

    /// Strategy for a table (Conservative when unregistered)
    pub fn strategy_for(&self, table: &TableRef) -> SweepStrategy {
        self.strategies
            .get(table)
            .copied()
            .unwrap_or(SweepStrategy::Conservative)
    }
}
