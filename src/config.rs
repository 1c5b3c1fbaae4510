//! Configuration for sweepkv
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, SweepError};

/// Main configuration for the targeted sweep subsystem
#[derive(Debug, Clone)]
pub struct SweepConfig {
    // -------------------------------------------------------------------------
    // Encoding Configuration
    // -------------------------------------------------------------------------
    /// Number of fine tickets per coarse partition. Must be a power of two.
    ///
    /// Trade-off: a larger span packs more concurrent commits into the
    /// columns of one row (fewer rows, more fan-in per row under bursts);
    /// a smaller span creates rows faster but bounds per-row write rate.
    pub ticket_span: u64,

    // -------------------------------------------------------------------------
    // Boundary Configuration
    // -------------------------------------------------------------------------
    /// Subtracted from the computed sweep boundary to absorb clock and
    /// propagation skew between boundary computation and delete issuance.
    ///
    /// Trade-off: larger margin sweeps less aggressively but tolerates more
    /// skew; zero margin assumes perfectly synchronized observers.
    pub safety_margin: u64,

    // -------------------------------------------------------------------------
    // Sharding Configuration
    // -------------------------------------------------------------------------
    /// Number of sweep queue shards. Must not change while unprocessed
    /// entries from a prior shard count exist (requires a full queue drain).
    pub num_shards: u16,

    // -------------------------------------------------------------------------
    // Batch Processing Configuration
    // -------------------------------------------------------------------------
    /// Max queue entries consumed per sweep invocation (bounds per-cycle
    /// work and memory).
    pub batch_size: usize,

    /// Per-host retry attempts for transient delete failures.
    pub delete_retries: usize,

    /// Initial backoff between delete retries (milliseconds), doubled per
    /// attempt.
    pub delete_backoff_ms: u64,

    /// Max storage hosts addressed concurrently during delete fan-out.
    pub delete_parallelism: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            ticket_span: 1 << 16,
            safety_margin: 5,
            num_shards: 8,
            batch_size: 128,
            delete_retries: 3,
            delete_backoff_ms: 50,
            delete_parallelism: 4,
        }
    }
}

impl SweepConfig {
    /// Create a new config builder
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }

    /// Validate invariants that the rest of the subsystem assumes
    pub fn validate(&self) -> Result<()> {
        if !self.ticket_span.is_power_of_two() {
            return Err(SweepError::Config(format!(
                "ticket_span must be a power of two, got {}",
                self.ticket_span
            )));
        }
        if self.num_shards == 0 {
            return Err(SweepError::Config("num_shards must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(SweepError::Config("batch_size must be at least 1".to_string()));
        }
        if self.delete_parallelism == 0 {
            return Err(SweepError::Config(
                "delete_parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for SweepConfig
#[derive(Default)]
pub struct SweepConfigBuilder {
    config: SweepConfig,
}

impl SweepConfigBuilder {
    /// Set the number of fine tickets per coarse partition
    pub fn ticket_span(mut self, span: u64) -> Self {
        self.config.ticket_span = span;
        self
    }

    /// Set the boundary safety margin
    pub fn safety_margin(mut self, margin: u64) -> Self {
        self.config.safety_margin = margin;
        self
    }

    /// Set the number of sweep queue shards
    pub fn num_shards(mut self, shards: u16) -> Self {
        self.config.num_shards = shards;
        self
    }

    /// Set the max entries per sweep batch
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the per-host delete retry count
    pub fn delete_retries(mut self, retries: usize) -> Self {
        self.config.delete_retries = retries;
        self
    }

    /// Set the initial delete retry backoff (in milliseconds)
    pub fn delete_backoff_ms(mut self, ms: u64) -> Self {
        self.config.delete_backoff_ms = ms;
        self
    }

    /// Set the delete fan-out parallelism
    pub fn delete_parallelism(mut self, workers: usize) -> Self {
        self.config.delete_parallelism = workers;
        self
    }

    pub fn build(self) -> Result<SweepConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
