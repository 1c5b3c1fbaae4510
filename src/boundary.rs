//! Sweep Boundary Calculator
//!
//! Computes the highest start timestamp below which no live transaction
//! can still observe pre-sweep versions:
//!
//! ```text
//! boundary = min(unreadable_ts, min_immutable_ts_of_live_txns) - safety_margin
//! ```
//!
//! Both inputs come from the external timestamp/lease service. When the
//! service is unreachable or its answer cannot be trusted, the calculator
//! signals `BoundaryUnavailable` rather than guessing - the only safe
//! reaction is to skip the sweep cycle. The boundary can only grow over
//! time (transactions finish, never un-finish), so each cycle recomputes
//! it fresh instead of reusing a stale in-memory value.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::MIN_VALID_TIMESTAMP;
use crate::error::{Result, SweepError};
use crate::storage::Timestamp;

// =============================================================================
// Timestamp Authority Interface
// =============================================================================

/// External timestamp/lease service.
pub trait TimestampAuthority: Send + Sync {
    /// Highest timestamp no new reader can be issued below
    fn current_unreadable_timestamp(&self) -> Result<Timestamp>;

    /// Minimum immutable timestamp across live transactions, or `None`
    /// when no transaction is live.
    ///
    /// Implementations must return `Err` - not `Ok(None)` - when liveness
    /// information cannot be trusted (lease lapsed, service partitioned).
    fn minimum_immutable_timestamp(&self) -> Result<Option<Timestamp>>;
}

// =============================================================================
// Boundary Calculator
// =============================================================================

/// Computes the safe sweep boundary for a cycle.
pub struct SweepBoundaryCalculator {
    authority: Arc<dyn TimestampAuthority>,
    safety_margin: u64,
}

impl SweepBoundaryCalculator {
    pub fn new(authority: Arc<dyn TimestampAuthority>, safety_margin: u64) -> Self {
        Self {
            authority,
            safety_margin,
        }
    }

    /// The highest timestamp strictly below which versions may be swept
    /// this cycle.
    ///
    /// Any authority failure maps to `BoundaryUnavailable`; the margin
    /// absorbs clock/propagation skew between this computation and the
    /// delete issuance. The result never drops below the smallest valid
    /// timestamp (a floor boundary just means "nothing to sweep yet").
    pub fn sweep_boundary(&self) -> Result<Timestamp> {
        let unreadable = self
            .authority
            .current_unreadable_timestamp()
            .map_err(|e| SweepError::BoundaryUnavailable(format!("unreadable timestamp: {}", e)))?;

        let min_immutable = self
            .authority
            .minimum_immutable_timestamp()
            .map_err(|e| SweepError::BoundaryUnavailable(format!("immutable timestamp: {}", e)))?;

        // No live transactions: the unreadable timestamp alone bounds what
        // any future transaction could observe
        let candidate = match min_immutable {
            Some(immutable) => unreadable.min(immutable),
            None => unreadable,
        };

        let boundary = candidate
            .saturating_sub(self.safety_margin)
            .max(MIN_VALID_TIMESTAMP);

        debug!(unreadable, ?min_immutable, boundary, "computed sweep boundary");
        Ok(boundary)
    }
}

// =============================================================================
// In-Memory Authority (tests and single-process deployments)
// =============================================================================

/// Adjustable timestamp authority backed by process-local state.
#[derive(Default)]
pub struct InMemoryTimestampAuthority {
    unreadable: AtomicU64,
    min_immutable: RwLock<Option<Timestamp>>,
    unavailable: AtomicBool,
}

impl InMemoryTimestampAuthority {
    pub fn new(unreadable: Timestamp) -> Self {
        Self {
            unreadable: AtomicU64::new(unreadable),
            min_immutable: RwLock::new(None),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unreadable_timestamp(&self, ts: Timestamp) {
        self.unreadable.store(ts, Ordering::SeqCst);
    }

    pub fn set_minimum_immutable_timestamp(&self, ts: Option<Timestamp>) {
        *self.min_immutable.write() = ts;
    }

    /// Make subsequent authority calls fail (simulates partition/lapse)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SweepError::StorageTransient(
                "timestamp authority unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

impl TimestampAuthority for InMemoryTimestampAuthority {
    fn current_unreadable_timestamp(&self) -> Result<Timestamp> {
        self.check_available()?;
        Ok(self.unreadable.load(Ordering::SeqCst))
    }

    fn minimum_immutable_timestamp(&self) -> Result<Option<Timestamp>> {
        self.check_available()?;
        Ok(*self.min_immutable.read())
    }
}
