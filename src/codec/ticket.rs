//! Ticket encoding of start timestamps
//!
//! A start timestamp is split into a coarse partition (selects the row) and
//! a fine ticket (selects the column). Nearby timestamps share a row but
//! occupy distinct columns, so a burst of commits fans out across columns
//! rather than serializing on a single row, and the row count grows only
//! once per `ticket_span` timestamps.
//!
//! Both key components are fixed-width big-endian, so a lexicographic scan
//! over `(row, column)` visits timestamps in strictly ascending order.

use bytes::BufMut;

use crate::error::{Result, SweepError};
use crate::shard::{ShardAndStrategy, SweepStrategy};
use crate::storage::Timestamp;

use super::validate_timestamp;

/// Row key byte length: shard (2) + strategy (1) + coarse partition (8)
pub const ROW_KEY_LEN: usize = 11;

/// Column key byte length: fine ticket (8)
pub const COLUMN_KEY_LEN: usize = 8;

/// A start timestamp in its split form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketCell {
    /// `ts / ticket_span` - selects the row
    pub coarse_partition: u64,

    /// `ts % ticket_span` - selects the column within the row
    pub fine_ticket: u64,
}

/// Splits timestamps into (coarse partition, fine ticket) pairs and lays
/// them out as storage keys.
#[derive(Debug, Clone)]
pub struct TicketCodec {
    ticket_span: u64,
    shift: u32,
    mask: u64,
}

impl TicketCodec {
    /// Create a codec with the given span (must be a power of two >= 2)
    pub fn new(ticket_span: u64) -> Result<Self> {
        if !ticket_span.is_power_of_two() || ticket_span < 2 {
            return Err(SweepError::Config(format!(
                "ticket_span must be a power of two >= 2, got {}",
                ticket_span
            )));
        }
        Ok(Self {
            ticket_span,
            shift: ticket_span.trailing_zeros(),
            mask: ticket_span - 1,
        })
    }

    pub fn ticket_span(&self) -> u64 {
        self.ticket_span
    }

    // =========================================================================
    // Timestamp <-> Ticket Split
    // =========================================================================

    /// Split a start timestamp into its ticket form
    ///
    /// Rejects out-of-domain input (zero or the max sentinel) before
    /// encoding.
    pub fn encode(&self, ts: Timestamp) -> Result<TicketCell> {
        let ts = validate_timestamp(ts)?;
        Ok(TicketCell {
            coarse_partition: ts >> self.shift,
            fine_ticket: ts & self.mask,
        })
    }

    /// Exact inverse of [`encode`](Self::encode)
    pub fn decode(&self, cell: TicketCell) -> Result<Timestamp> {
        if cell.fine_ticket >= self.ticket_span {
            return Err(SweepError::MalformedEncoding(format!(
                "fine ticket {} exceeds span {}",
                cell.fine_ticket, self.ticket_span
            )));
        }
        validate_timestamp((cell.coarse_partition << self.shift) | cell.fine_ticket)
    }

    // =========================================================================
    // Storage Key Layout
    // =========================================================================

    /// Row key for a partition's coarse bucket
    pub fn row_key(&self, partition: ShardAndStrategy, coarse_partition: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(ROW_KEY_LEN);
        key.put_u16(partition.shard);
        key.put_u8(partition.strategy.as_byte());
        key.put_u64(coarse_partition);
        key
    }

    /// Column key for a fine ticket
    pub fn column_key(&self, fine_ticket: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(COLUMN_KEY_LEN);
        key.put_u64(fine_ticket);
        key
    }

    /// Full (row, column) key pair for one queue entry
    pub fn encode_queue_keys(
        &self,
        partition: ShardAndStrategy,
        ts: Timestamp,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let cell = self.encode(ts)?;
        Ok((
            self.row_key(partition, cell.coarse_partition),
            self.column_key(cell.fine_ticket),
        ))
    }

    /// Recover partition identity and coarse bucket from a row key
    pub fn decode_row_key(&self, row: &[u8]) -> Result<(ShardAndStrategy, u64)> {
        if row.len() != ROW_KEY_LEN {
            return Err(SweepError::MalformedEncoding(format!(
                "row key must be {} bytes, got {}",
                ROW_KEY_LEN,
                row.len()
            )));
        }
        let shard = u16::from_be_bytes([row[0], row[1]]);
        let strategy = SweepStrategy::from_byte(row[2])?;
        let coarse = u64::from_be_bytes([
            row[3], row[4], row[5], row[6], row[7], row[8], row[9], row[10],
        ]);
        Ok((ShardAndStrategy::new(shard, strategy), coarse))
    }

    /// Recover the fine ticket from a column key
    pub fn decode_column_key(&self, column: &[u8]) -> Result<u64> {
        if column.len() != COLUMN_KEY_LEN {
            return Err(SweepError::MalformedEncoding(format!(
                "column key must be {} bytes, got {}",
                COLUMN_KEY_LEN,
                column.len()
            )));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(column);
        Ok(u64::from_be_bytes(buf))
    }

    /// Recover the original start timestamp from a (row, column) key pair
    pub fn decode_queue_keys(&self, row: &[u8], column: &[u8]) -> Result<(ShardAndStrategy, Timestamp)> {
        let (partition, coarse) = self.decode_row_key(row)?;
        let fine = self.decode_column_key(column)?;
        let ts = self.decode(TicketCell {
            coarse_partition: coarse,
            fine_ticket: fine,
        })?;
        Ok((partition, ts))
    }
}
