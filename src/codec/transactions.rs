//! Cell layout for the transactions table
//!
//! The commit timestamp of every transaction is stored keyed by a cell
//! derived from its start timestamp, using the same ticket split as the
//! sweep queue: the coarse partition names the row and the fine ticket
//! names the column, so commit writes scatter across columns instead of
//! hammering one row. The value is the delta encoding from
//! [`super::delta`].

use bytes::BufMut;

use crate::error::{Result, SweepError};
use crate::storage::{Cell, Timestamp};

use super::delta::{decode_commit_delta, encode_commit_delta};
use super::ticket::{TicketCell, TicketCodec};

/// Encodes transaction commit records as (cell, delta value) pairs.
#[derive(Debug, Clone)]
pub struct TransactionsCodec {
    tickets: TicketCodec,
}

impl TransactionsCodec {
    pub fn new(ticket_span: u64) -> Result<Self> {
        Ok(Self {
            tickets: TicketCodec::new(ticket_span)?,
        })
    }

    /// Cell addressing the commit record of `start_ts`
    pub fn commit_cell(&self, start_ts: Timestamp) -> Result<Cell> {
        let split = self.tickets.encode(start_ts)?;

        let mut row = Vec::with_capacity(8);
        row.put_u64(split.coarse_partition);
        let mut column = Vec::with_capacity(8);
        column.put_u64(split.fine_ticket);

        Ok(Cell::new(row, column))
    }

    /// Recover the start timestamp a commit cell belongs to
    pub fn decode_commit_cell(&self, cell: &Cell) -> Result<Timestamp> {
        let coarse = read_u64(&cell.row, "transactions row key")?;
        let fine = read_u64(&cell.column, "transactions column key")?;
        self.tickets.decode(TicketCell {
            coarse_partition: coarse,
            fine_ticket: fine,
        })
    }

    /// Value bytes recording `commit_ts` against `start_ts`
    pub fn commit_value(&self, start_ts: Timestamp, commit_ts: Timestamp) -> Result<Vec<u8>> {
        encode_commit_delta(start_ts, commit_ts)
    }

    /// Recover the absolute commit timestamp from a stored value
    pub fn decode_commit_value(&self, start_ts: Timestamp, value: &[u8]) -> Result<Timestamp> {
        decode_commit_delta(start_ts, value)
    }
}

fn read_u64(bytes: &[u8], what: &str) -> Result<u64> {
    if bytes.len() != 8 {
        return Err(SweepError::MalformedEncoding(format!(
            "{} must be 8 bytes, got {}",
            what,
            bytes.len()
        )));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(u64::from_be_bytes(buf))
}
