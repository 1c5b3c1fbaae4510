//! Sweep Queue Module
//!
//! Durable record of pending writes awaiting sweep, plus the persisted
//! per-partition progress marker.
//!
//! ## Responsibilities
//! - Idempotent enqueue of write references at transaction commit
//! - Ordered batch reads honoring the ticket codec's row/column layout
//! - Deletion of entries once their obsolete versions are confirmed gone
//! - Monotonic progress markers guarded by compare-and-set at the store
//!   boundary (safe under brief multi-writer overlap during failover)
//!
//! ## Persisted Layout
//! ```text
//! Queue rows                                   Columns
//! ┌───────────┬─────────────┬───────────────┐  ┌──────────────────┐
//! │ Shard (2) │ Strategy(1) │ Partition (8) │  │ Fine Ticket (8)  │
//! └───────────┴─────────────┴───────────────┘  └──────────────────┘
//!                                              value: write refs (bincode)
//!
//! Progress: one record per (shard, strategy) holding a single timestamp
//! ```

mod entry;
mod store;
mod writer;

pub use entry::QueueEntry;
pub use store::{InMemorySweepQueue, SweepQueueStore};
pub use writer::SweepQueueWriter;
