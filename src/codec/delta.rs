//! Commit timestamp delta encoding
//!
//! A commit timestamp is persisted as the variable-length delta
//! `commit - start` rather than the absolute value: commits land almost
//! immediately after their start, so the delta is typically one or two
//! bytes instead of eight.
//!
//! Contract: `decode_commit_delta(s, encode_commit_delta(s, c)) == c` for
//! all `0 <= s <= c < 2^63`.

use crate::error::{Result, SweepError};
use crate::storage::Timestamp;

/// Exclusive upper bound of the timestamp space (`2^63`)
const TIMESTAMP_LIMIT: u64 = 1 << 63;

/// Max bytes a varint-encoded u64 can occupy
const MAX_VARINT_LEN: usize = 10;

/// Encode `commit - start` as a varint value
pub fn encode_commit_delta(start: Timestamp, commit: Timestamp) -> Result<Vec<u8>> {
    if start >= TIMESTAMP_LIMIT - 1 {
        return Err(SweepError::InvalidTimestamp(start));
    }
    if commit >= TIMESTAMP_LIMIT || commit < start {
        return Err(SweepError::InvalidTimestamp(commit));
    }
    Ok(write_varint(commit - start))
}

/// Decode a varint delta back into the absolute commit timestamp
pub fn decode_commit_delta(start: Timestamp, value: &[u8]) -> Result<Timestamp> {
    let delta = read_varint(value)?;
    let commit = start.checked_add(delta).ok_or_else(|| {
        SweepError::MalformedEncoding(format!(
            "commit delta {} overflows from start {}",
            delta, start
        ))
    })?;
    if commit >= TIMESTAMP_LIMIT {
        return Err(SweepError::MalformedEncoding(format!(
            "decoded commit timestamp {} outside 63-bit domain",
            commit
        )));
    }
    Ok(commit)
}

// =============================================================================
// Varint Primitives (LEB128, low 7 bits per byte, high bit = continuation)
// =============================================================================

fn write_varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(2);
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out
}

fn read_varint(bytes: &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(SweepError::MalformedEncoding(
                "varint exceeds 10 bytes".to_string(),
            ));
        }
        let chunk = u64::from(byte & 0x7F);
        value |= chunk
            .checked_shl(shift)
            .filter(|_| shift < 64 && (shift != 63 || chunk <= 1))
            .ok_or_else(|| {
                SweepError::MalformedEncoding("varint overflows u64".to_string())
            })?;
        if byte & 0x80 == 0 {
            // Trailing garbage after the terminator is a framing bug
            if i + 1 != bytes.len() {
                return Err(SweepError::MalformedEncoding(format!(
                    "{} trailing bytes after varint terminator",
                    bytes.len() - i - 1
                )));
            }
            return Ok(value);
        }
        shift += 7;
    }

    Err(SweepError::MalformedEncoding(
        "truncated varint: missing terminator".to_string(),
    ))
}
