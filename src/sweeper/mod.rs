//! Sweep Batch Processor Module
//!
//! The per-partition state machine that turns queued write references into
//! deleted obsolete versions.
//!
//! ## One invocation
//! ```text
//! Idle → BoundaryComputed → BatchRead → VersionsClassified
//!      → DeletesIssued → ProgressAdvanced → Idle
//! ```
//!
//! ## Responsibilities
//! - Consult the boundary calculator (skip the cycle when unavailable)
//! - Read a bounded batch of queue entries in timestamp order
//! - Classify retained vs. obsolete versions per the partition's strategy
//! - Fan deletions out across storage hosts, then advance progress
//!
//! Every durable mutation is idempotent and progress is advanced only
//! after deletions succeed, so a crash between any two transitions makes
//! the next cycle redo work rather than lose it.

mod classify;
mod processor;

pub use classify::CellClassification;
pub use processor::{SweepOutcome, TargetedSweeper};
