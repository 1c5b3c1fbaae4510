//! Storage Interface Tests
//!
//! Tests for the in-memory versioned KVS and the host-partitioned delete
//! executor:
//! - Snapshot read and version enumeration bounds (strictly below)
//! - Idempotent version deletion
//! - Retry on transient failures, cancel-on-first-failure across a batch

use sweepkv::storage::{
    Cell, CellValue, DeleteExecutor, DeleteRequest, HostPartitioner, InMemoryKvs, KeyValueService,
    ModuloHostPartitioner, SingleHostPartitioner, TableRef,
};

fn table() -> TableRef {
    TableRef::new("profiles")
}

fn cell(row: &[u8]) -> Cell {
    Cell::new(row, b"col".to_vec())
}

fn data(bytes: &[u8]) -> CellValue {
    CellValue::Data(bytes.to_vec())
}

// =============================================================================
// Versioned KVS Tests
// =============================================================================

#[test]
fn test_get_returns_latest_strictly_below_bound() {
    let kvs = InMemoryKvs::new();
    let (table, cell) = (table(), cell(b"row"));

    kvs.put(&table, &cell, 10, data(b"v10")).unwrap();
    kvs.put(&table, &cell, 20, data(b"v20")).unwrap();

    // Bound is exclusive: a reader at ts 20 sees the version at 10
    assert_eq!(kvs.get(&table, &cell, 20).unwrap(), Some((10, data(b"v10"))));
    assert_eq!(kvs.get(&table, &cell, 21).unwrap(), Some((20, data(b"v20"))));
    assert_eq!(kvs.get(&table, &cell, 10).unwrap(), None);
}

#[test]
fn test_get_all_versions_ascending_below_bound() {
    let kvs = InMemoryKvs::new();
    let (table, c) = (table(), cell(b"row"));

    for ts in [30, 10, 20, 40] {
        kvs.put(&table, &c, ts, data(b"v")).unwrap();
    }

    let versions = kvs.get_all_versions(&table, &[c.clone()], 40).unwrap();
    assert_eq!(versions.get(&c).unwrap(), &vec![10, 20, 30]);

    // Cells without versions below the bound are simply absent
    let none = kvs.get_all_versions(&table, &[cell(b"other")], 40).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_delete_removes_single_version_idempotently() {
    let kvs = InMemoryKvs::new();
    let (table, c) = (table(), cell(b"row"));

    kvs.put(&table, &c, 10, data(b"v10")).unwrap();
    kvs.put(&table, &c, 20, data(b"v20")).unwrap();

    kvs.delete(&table, &c, 10).unwrap();
    assert_eq!(kvs.version_timestamps(&table, &c), vec![20]);

    // Deleting the absent version again is a no-op success
    kvs.delete(&table, &c, 10).unwrap();
    assert_eq!(kvs.version_timestamps(&table, &c), vec![20]);
}

#[test]
fn test_tombstones_are_ordinary_versions() {
    let kvs = InMemoryKvs::new();
    let (table, c) = (table(), cell(b"row"));

    kvs.put(&table, &c, 10, data(b"v10")).unwrap();
    kvs.put(&table, &c, 20, CellValue::Tombstone).unwrap();

    let (ts, value) = kvs.get(&table, &c, 30).unwrap().unwrap();
    assert_eq!(ts, 20);
    assert!(value.is_tombstone());
    assert_eq!(kvs.version_count(&table, &c), 2);
}

// =============================================================================
// Delete Executor Tests
// =============================================================================

fn requests(count: usize) -> Vec<DeleteRequest> {
    (0..count)
        .map(|i| DeleteRequest {
            cell: cell(format!("row-{}", i).as_bytes()),
            timestamp: 10,
        })
        .collect()
}

fn populate(kvs: &InMemoryKvs, table: &TableRef, count: usize) {
    for request in requests(count) {
        kvs.put(table, &request.cell, request.timestamp, data(b"v")).unwrap();
    }
}

#[test]
fn test_executor_deletes_across_hosts() {
    let kvs = InMemoryKvs::new();
    let table = table();
    populate(&kvs, &table, 20);

    let partitioner = ModuloHostPartitioner::new(4);
    let executor = DeleteExecutor::new(&kvs, &partitioner, 0, 1, 4);
    let deleted = executor.execute(&table, &requests(20)).unwrap();

    assert_eq!(deleted, 20);
    for request in requests(20) {
        assert_eq!(kvs.version_count(&table, &request.cell), 0);
    }
}

#[test]
fn test_executor_retries_transient_failures() {
    let kvs = InMemoryKvs::new();
    let table = table();
    populate(&kvs, &table, 5);

    // Two injected faults, three attempts allowed per delete
    kvs.fail_next_deletes(2);
    let partitioner = SingleHostPartitioner;
    let executor = DeleteExecutor::new(&kvs, &partitioner, 2, 1, 1);

    assert_eq!(executor.execute(&table, &requests(5)).unwrap(), 5);
}

#[test]
fn test_executor_fails_when_retries_exhaust() {
    let kvs = InMemoryKvs::new();
    let table = table();
    populate(&kvs, &table, 5);

    // More faults than a single delete's retry budget
    kvs.fail_next_deletes(10);
    let partitioner = SingleHostPartitioner;
    let executor = DeleteExecutor::new(&kvs, &partitioner, 1, 1, 1);

    let err = executor.execute(&table, &requests(5)).unwrap_err();
    assert!(err.is_transient(), "expected transient error, got {:?}", err);
}

#[test]
fn test_executor_cancels_batch_on_first_failure() {
    let kvs = InMemoryKvs::new();
    let table = table();
    populate(&kvs, &table, 50);

    // Only the very first delete fails; with one worker and no retries
    // the cancellation must keep every later delete from being issued
    kvs.fail_next_deletes(1);
    let partitioner = ModuloHostPartitioner::new(8);
    let executor = DeleteExecutor::new(&kvs, &partitioner, 0, 1, 1);

    assert!(executor.execute(&table, &requests(50)).is_err());
    let survivors: usize = requests(50)
        .iter()
        .map(|r| kvs.version_count(&table, &r.cell))
        .sum();
    assert_eq!(survivors, 50, "cancellation must leave later deletes unissued");
}

#[test]
fn test_executor_empty_batch_is_noop() {
    let kvs = InMemoryKvs::new();
    let partitioner = SingleHostPartitioner;
    let executor = DeleteExecutor::new(&kvs, &partitioner, 0, 1, 4);
    assert_eq!(executor.execute(&table(), &[]).unwrap(), 0);
}

#[test]
fn test_modulo_partitioner_is_deterministic() {
    let partitioner = ModuloHostPartitioner::new(4);
    let table = table();
    for i in 0..100u32 {
        let c = cell(format!("row-{}", i).as_bytes());
        let host = partitioner.host_for(&table, &c);
        assert!(host < 4);
        assert_eq!(host, partitioner.host_for(&table, &c));
    }
}
