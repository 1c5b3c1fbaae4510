//! Timestamp Codec Module
//!
//! Bidirectional encoding between logical timestamps and compact storage
//! keys/values.
//!
//! ## Responsibilities
//! - Split a start timestamp into (coarse partition, fine ticket) so that
//!   concurrent commits scatter across columns instead of serializing on
//!   one row, while scans still see timestamps in ascending order
//! - Fixed-width big-endian row/column key layout (byte order == numeric
//!   order)
//! - Variable-length delta encoding of commit timestamps against their
//!   start timestamp
//!
//! ## Queue Key Layout
//! ```text
//! Row key (11 bytes)                          Column key (8 bytes)
//! ┌───────────┬─────────────┬───────────────┐ ┌───────────────────┐
//! │ Shard (2) │ Strategy(1) │ Partition (8) │ │  Fine Ticket (8)  │
//! └───────────┴─────────────┴───────────────┘ └───────────────────┘
//! ```
//!
//! With `ticket_span = 2^16`, timestamp `ts` lands in partition
//! `ts >> 16`, ticket `ts & 0xFFFF`; decode is `(p << 16) | r`, exact over
//! the full domain `[1, 2^63 - 2]`.

mod delta;
mod ticket;
mod transactions;

pub use delta::{decode_commit_delta, encode_commit_delta};
pub use ticket::{TicketCell, TicketCodec, COLUMN_KEY_LEN, ROW_KEY_LEN};
pub use transactions::TransactionsCodec;

use crate::error::{Result, SweepError};
use crate::storage::Timestamp;

/// Smallest encodable start timestamp
pub const MIN_VALID_TIMESTAMP: Timestamp = 1;

/// Largest encodable start timestamp: `2^63 - 2`. Zero and the `2^63 - 1`
/// sentinel are rejected before encoding.
pub const MAX_VALID_TIMESTAMP: Timestamp = (1 << 63) - 2;

/// Reject timestamps outside `[MIN_VALID_TIMESTAMP, MAX_VALID_TIMESTAMP]`
pub fn validate_timestamp(ts: Timestamp) -> Result<Timestamp> {
    if !(MIN_VALID_TIMESTAMP..=MAX_VALID_TIMESTAMP).contains(&ts) {
        return Err(SweepError::InvalidTimestamp(ts));
    }
    Ok(ts)
}
