//! Codec Tests
//!
//! Tests for the ticket split, storage key layout, and commit delta
//! encoding:
//! - Exact encode/decode inverses over the valid domain
//! - Domain rejection (zero, the max sentinel)
//! - Injectivity and scan-order monotonicity of the key layout
//! - Variable-length commit delta round-trips and malformed input

use sweepkv::codec::{
    decode_commit_delta, encode_commit_delta, TicketCodec, TransactionsCodec, COLUMN_KEY_LEN,
    MAX_VALID_TIMESTAMP, MIN_VALID_TIMESTAMP, ROW_KEY_LEN,
};
use sweepkv::{ShardAndStrategy, SweepError, SweepStrategy};

const SPAN: u64 = 1 << 16;

fn codec() -> TicketCodec {
    TicketCodec::new(SPAN).unwrap()
}

/// Deterministic pseudo-random walk over the 63-bit domain
fn sample_timestamps(count: usize) -> Vec<u64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            MIN_VALID_TIMESTAMP + state % (MAX_VALID_TIMESTAMP - MIN_VALID_TIMESTAMP + 1)
        })
        .collect()
}

// =============================================================================
// Ticket Split Tests
// =============================================================================

#[test]
fn test_encode_decode_inverse_over_sampled_domain() {
    let codec = codec();
    for ts in sample_timestamps(1000) {
        let cell = codec.encode(ts).unwrap();
        assert_eq!(codec.decode(cell).unwrap(), ts);
    }
}

#[test]
fn test_encode_decode_domain_edges() {
    let codec = codec();
    for ts in [
        MIN_VALID_TIMESTAMP,
        SPAN - 1,
        SPAN,
        SPAN + 1,
        MAX_VALID_TIMESTAMP,
    ] {
        let cell = codec.encode(ts).unwrap();
        assert_eq!(codec.decode(cell).unwrap(), ts);
    }
}

#[test]
fn test_encode_rejects_out_of_domain() {
    let codec = codec();
    for ts in [0, MAX_VALID_TIMESTAMP + 1, u64::MAX] {
        match codec.encode(ts) {
            Err(SweepError::InvalidTimestamp(rejected)) => assert_eq!(rejected, ts),
            other => panic!("expected InvalidTimestamp for {}, got {:?}", ts, other),
        }
    }
}

#[test]
fn test_spec_scenario_partitions_and_tickets() {
    // Timestamps {100, 100016, 200032} under span 65536 land in coarse
    // partitions {0, 1, 3} with fine tickets {100, 16, 16}
    let codec = codec();
    let cases = [(100u64, 0u64, 100u64), (100_016, 1, 34_480), (200_032, 3, 3_424)];
    // 100016 = 1*65536 + 34480; 200032 = 3*65536 + 3424
    for (ts, partition, ticket) in cases {
        let cell = codec.encode(ts).unwrap();
        assert_eq!(cell.coarse_partition, partition, "partition of {}", ts);
        assert_eq!(cell.fine_ticket, ticket, "ticket of {}", ts);
        assert_eq!(codec.decode(cell).unwrap(), ts);
    }
}

#[test]
fn test_rejects_non_power_of_two_span() {
    assert!(TicketCodec::new(1000).is_err());
    assert!(TicketCodec::new(0).is_err());
    assert!(TicketCodec::new(1).is_err());
    assert!(TicketCodec::new(2).is_ok());
}

#[test]
fn test_decode_rejects_ticket_exceeding_span() {
    let codec = codec();
    let cell = codec.encode(12345).unwrap();
    let bad = sweepkv::codec::TicketCell {
        coarse_partition: cell.coarse_partition,
        fine_ticket: SPAN,
    };
    assert!(codec.decode(bad).is_err());
}

// =============================================================================
// Key Layout Tests
// =============================================================================

#[test]
fn test_queue_key_round_trip() {
    let codec = codec();
    let partition = ShardAndStrategy::new(3, SweepStrategy::Thorough);

    for ts in sample_timestamps(200) {
        let (row, column) = codec.encode_queue_keys(partition, ts).unwrap();
        assert_eq!(row.len(), ROW_KEY_LEN);
        assert_eq!(column.len(), COLUMN_KEY_LEN);

        let (decoded_partition, decoded_ts) = codec.decode_queue_keys(&row, &column).unwrap();
        assert_eq!(decoded_partition, partition);
        assert_eq!(decoded_ts, ts);
    }
}

#[test]
fn test_encoding_is_injective() {
    // Distinct timestamps never collide on the same (row, column) pair
    let codec = codec();
    let partition = ShardAndStrategy::conservative(0);

    let mut seen = std::collections::HashSet::new();
    let mut timestamps = sample_timestamps(500);
    timestamps.extend([1, 2, SPAN - 1, SPAN, SPAN + 1, MAX_VALID_TIMESTAMP]);
    timestamps.sort_unstable();
    timestamps.dedup();

    for ts in timestamps {
        let keys = codec.encode_queue_keys(partition, ts).unwrap();
        assert!(seen.insert(keys), "collision at timestamp {}", ts);
    }
}

#[test]
fn test_key_scan_order_matches_timestamp_order() {
    // Sorting by (row, column) byte order must yield strictly ascending
    // timestamps - the batch reader consumes entries as an ordered stream
    let codec = codec();
    let partition = ShardAndStrategy::conservative(7);

    let mut keyed: Vec<((Vec<u8>, Vec<u8>), u64)> = sample_timestamps(500)
        .into_iter()
        .map(|ts| (codec.encode_queue_keys(partition, ts).unwrap(), ts))
        .collect();
    keyed.sort();
    keyed.dedup();

    for pair in keyed.windows(2) {
        assert!(
            pair[0].1 < pair[1].1,
            "scan order inversion: {} before {}",
            pair[0].1,
            pair[1].1
        );
    }
}

#[test]
fn test_decode_rejects_malformed_keys() {
    let codec = codec();
    assert!(codec.decode_row_key(&[0u8; 5]).is_err());
    assert!(codec.decode_column_key(&[0u8; 3]).is_err());

    // Unknown strategy byte
    let partition = ShardAndStrategy::conservative(0);
    let mut row = codec.row_key(partition, 1);
    row[2] = 0xFF;
    assert!(codec.decode_row_key(&row).is_err());
}

// =============================================================================
// Commit Delta Tests
// =============================================================================

#[test]
fn test_commit_delta_round_trip() {
    let mut state: u64 = 42;
    for _ in 0..1000 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let start = state % ((1 << 63) - 1);
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let commit = start + state % ((1u64 << 63) - start);

        let encoded = encode_commit_delta(start, commit).unwrap();
        assert_eq!(decode_commit_delta(start, &encoded).unwrap(), commit);
    }
}

#[test]
fn test_commit_delta_edges() {
    // Zero start, zero delta, and the extremes of the 63-bit domain
    let cases = [
        (0u64, 0u64),
        (0, (1 << 63) - 1),
        (17, 17),
        ((1 << 63) - 2, (1 << 63) - 1),
        (1, 2),
    ];
    for (start, commit) in cases {
        let encoded = encode_commit_delta(start, commit).unwrap();
        assert_eq!(
            decode_commit_delta(start, &encoded).unwrap(),
            commit,
            "({}, {})",
            start,
            commit
        );
    }
}

#[test]
fn test_commit_delta_is_compact_for_nearby_commits() {
    // The whole point of the delta: commits close to their start encode in
    // one or two bytes instead of eight
    assert_eq!(encode_commit_delta(1_000_000, 1_000_000).unwrap().len(), 1);
    assert_eq!(encode_commit_delta(1_000_000, 1_000_005).unwrap().len(), 1);
    assert_eq!(encode_commit_delta(1_000_000, 1_000_500).unwrap().len(), 2);
}

#[test]
fn test_commit_delta_rejects_commit_before_start() {
    assert!(encode_commit_delta(100, 99).is_err());
}

#[test]
fn test_commit_delta_rejects_out_of_domain() {
    assert!(encode_commit_delta(u64::MAX, u64::MAX).is_err());
    assert!(encode_commit_delta(0, 1 << 63).is_err());
}

#[test]
fn test_decode_rejects_malformed_varint() {
    // Truncated (all continuation bits)
    assert!(decode_commit_delta(0, &[0x80, 0x80]).is_err());
    // Empty
    assert!(decode_commit_delta(0, &[]).is_err());
    // Trailing garbage after terminator
    assert!(decode_commit_delta(0, &[0x05, 0x00]).is_err());
    // Overflows past 63 bits from a large start
    let encoded = encode_commit_delta(0, (1 << 63) - 1).unwrap();
    assert!(decode_commit_delta(2, &encoded).is_err());
}

// =============================================================================
// Transactions Codec Tests
// =============================================================================

#[test]
fn test_transactions_cell_round_trip() {
    let codec = TransactionsCodec::new(SPAN).unwrap();
    for ts in sample_timestamps(200) {
        let cell = codec.commit_cell(ts).unwrap();
        assert_eq!(codec.decode_commit_cell(&cell).unwrap(), ts);
    }
}

#[test]
fn test_transactions_value_round_trip() {
    let codec = TransactionsCodec::new(SPAN).unwrap();
    let value = codec.commit_value(5000, 5003).unwrap();
    assert_eq!(codec.decode_commit_value(5000, &value).unwrap(), 5003);
}

#[test]
fn test_transactions_nearby_starts_share_a_row() {
    // Concurrent commits scatter across columns of the same logical row
    let codec = TransactionsCodec::new(SPAN).unwrap();
    let a = codec.commit_cell(SPAN * 9 + 10).unwrap();
    let b = codec.commit_cell(SPAN * 9 + 11).unwrap();
    assert_eq!(a.row, b.row);
    assert_ne!(a.column, b.column);

    // While starts a span apart land on distinct rows
    let c = codec.commit_cell(SPAN * 10 + 10).unwrap();
    assert_ne!(a.row, c.row);
}
