//! Storage-level data model
//!
//! Types shared between the storage interface and the sweep core.

use serde::{Deserialize, Serialize};

/// Logical timestamp issued by the external timestamp authority.
///
/// 63-bit unsigned monotonic counter. Used in two roles: the *start
/// timestamp* of a transaction and its *commit timestamp*, with
/// `commit >= start` always.
pub type Timestamp = u64;

/// Reference to a logical table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef(String);

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (row, column) address within a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: Vec<u8>,
    pub column: Vec<u8>,
}

impl Cell {
    pub fn new(row: impl Into<Vec<u8>>, column: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
        }
    }
}

/// A single MVCC version's payload
///
/// A logical delete is written as a `Tombstone` version: it participates in
/// visibility and sweep retention exactly like a data version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    /// Regular data write
    Data(Vec<u8>),

    /// Logical delete marker
    Tombstone,
}

impl CellValue {
    pub fn is_tombstone(&self) -> bool {
        matches!(self, CellValue::Tombstone)
    }
}

/// Identity of one written cell, recorded at commit time
///
/// This is what the sweep queue persists per write: enough to find the
/// cell's versions later, plus whether the write was a logical delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WriteReference {
    pub table: TableRef,
    pub row: Vec<u8>,
    pub column: Vec<u8>,
    pub is_tombstone: bool,
}

impl WriteReference {
    pub fn new(
        table: TableRef,
        row: impl Into<Vec<u8>>,
        column: impl Into<Vec<u8>>,
        is_tombstone: bool,
    ) -> Self {
        Self {
            table,
            row: row.into(),
            column: column.into(),
            is_tombstone,
        }
    }

    /// The cell this write landed on
    pub fn cell(&self) -> Cell {
        Cell::new(self.row.clone(), self.column.clone())
    }
}
