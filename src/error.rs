//! Error types for sweepkv
//!
//! Provides a unified error type for all operations.
//!
//! The taxonomy matters operationally: `InvalidTimestamp` is a programming
//! error and is never retried; `BoundaryUnavailable` and `StorageTransient`
//! cause a skipped or aborted sweep cycle and are retried on the next
//! schedule; `ProgressConflict` means another processor owns the partition.
//! No variant is ever swallowed in a way that could advance progress past
//! unswept data.

use thiserror::Error;

/// Result type alias using SweepError
pub type Result<T> = std::result::Result<T, SweepError>;

/// Unified error type for sweepkv operations
#[derive(Debug, Error)]
pub enum SweepError {
    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// Timestamp outside the valid domain `[1, 2^63 - 2]`. Programming
    /// error on the caller's side; surfaced immediately, never retried.
    #[error("invalid timestamp {0}: outside valid domain [1, 2^63 - 2]")]
    InvalidTimestamp(u64),

    #[error("malformed key or value encoding: {0}")]
    MalformedEncoding(String),

    // -------------------------------------------------------------------------
    // Boundary Errors
    // -------------------------------------------------------------------------
    /// The sweep boundary could not be computed this cycle (timestamp
    /// authority unreachable or inconsistent). Callers must not sweep.
    #[error("sweep boundary unavailable: {0}")]
    BoundaryUnavailable(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// Transient storage failure (network, timeout). Retried with backoff
    /// at the host level; if retries exhaust, the cycle aborts without
    /// advancing progress.
    #[error("transient storage error: {0}")]
    StorageTransient(String),

    /// Permanent storage failure. Aborts the cycle.
    #[error("storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Progress Errors
    // -------------------------------------------------------------------------
    /// A writer attempted to move a progress marker backwards. Rejected by
    /// the store; evidence that another processor is active on the
    /// partition, so the cycle is treated as a no-op.
    #[error("progress conflict: attempted to set {attempted} below stored {stored}")]
    ProgressConflict { attempted: u64, stored: u64 },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl SweepError {
    /// True for failures that a subsequent cycle may succeed on without
    /// operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SweepError::BoundaryUnavailable(_) | SweepError::StorageTransient(_)
        )
    }
}
