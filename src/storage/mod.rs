//! Storage Module
//!
//! Interfaces onto the external replicated storage backend, plus the
//! in-memory reference implementation used by tests.
//!
//! ## Responsibilities
//! - Versioned get/put/delete-with-timestamp semantics (trait)
//! - Host-partitioned delete fan-out with per-host retry
//! - Data model shared with the sweep core (tables, cells, versions)
//!
//! The backend's replication protocol, client pooling, and consensus are
//! all behind these traits and out of scope here.

mod executor;
mod kvs;
mod types;

pub use executor::{
    DeleteExecutor, DeleteRequest, HostId, HostPartitioner, ModuloHostPartitioner,
    SingleHostPartitioner,
};
pub use kvs::{InMemoryKvs, KeyValueService};
pub use types::{Cell, CellValue, TableRef, Timestamp, WriteReference};
