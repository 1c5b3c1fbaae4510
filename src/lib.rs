//! # sweepkv
//!
//! Targeted sweep subsystem for a distributed MVCC key-value store:
//! - Hotspot-free ticket encoding of start timestamps
//! - Sharded, durable queue of pending writes with monotonic progress
//! - Snapshot-safe sweep boundary computation
//! - Crash-recoverable incremental batch deletion of obsolete versions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Transaction Commit Path                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ SweepQueueWriter (shard + ticket encode)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Sweep Queue Store                          │
//! │        (per-partition entries + progress marker)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ read_batch / delete_processed
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Targeted Sweeper                            │
//! │   (boundary → batch → classify → delete → advance)           │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │ Timestamp/Lease │            │  Storage Hosts  │
//!   │    Authority    │            │ (delete fan-out)│
//!   └─────────────────┘            └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod codec;
pub mod shard;
pub mod queue;
pub mod boundary;
pub mod sweeper;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SweepError};
pub use config::SweepConfig;

pub use boundary::{InMemoryTimestampAuthority, SweepBoundaryCalculator, TimestampAuthority};
pub use codec::{TicketCodec, TransactionsCodec, MAX_VALID_TIMESTAMP, MIN_VALID_TIMESTAMP};
pub use queue::{InMemorySweepQueue, QueueEntry, SweepQueueStore, SweepQueueWriter};
pub use shard::{ShardAndStrategy, ShardAssigner, StrategyRegistry, SweepStrategy};
pub use storage::{
    Cell, CellValue, InMemoryKvs, KeyValueService, TableRef, Timestamp, WriteReference,
};
pub use sweeper::{SweepOutcome, TargetedSweeper};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sweepkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
