//! Version classification under a sweep boundary
//!
//! Given every retained version of a cell strictly below the boundary,
//! decide which are obsolete:
//!
//! - `Thorough`: everything except the single newest version below the
//!   boundary is obsolete; the newest itself is also obsolete when it is a
//!   tombstone, since with no historical-read guarantee there is nothing
//!   left for it to shadow.
//! - `Conservative`: the newest version below the boundary always
//!   survives, even when a newer version exists above the boundary, so a
//!   reader whose snapshot equals the boundary always finds a value.
//!
//! A tombstone write is an ordinary version in every other respect.

use crate::shard::SweepStrategy;
use crate::storage::Timestamp;

/// Outcome of classifying one cell's versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellClassification {
    /// Versions to delete, ascending
    pub obsolete: Vec<Timestamp>,

    /// The version kept below the boundary, if any survives
    pub retained: Option<Timestamp>,
}

impl CellClassification {
    /// Classify `versions` (ascending, all strictly below the boundary).
    ///
    /// `newest_is_tombstone` reports whether the newest version below the
    /// boundary is a logical delete; only `Thorough` acts on it.
    pub fn classify(
        strategy: SweepStrategy,
        versions: &[Timestamp],
        newest_is_tombstone: bool,
    ) -> Self {
        let (rest, newest) = match versions.split_last() {
            Some((newest, rest)) => (rest, *newest),
            None => {
                return Self {
                    obsolete: Vec::new(),
                    retained: None,
                }
            }
        };

        let mut obsolete: Vec<Timestamp> = rest.to_vec();

        if strategy == SweepStrategy::Thorough && newest_is_tombstone {
            obsolete.push(newest);
            return Self {
                obsolete,
                retained: None,
            };
        }

        Self {
            obsolete,
            retained: Some(newest),
        }
    }
}
