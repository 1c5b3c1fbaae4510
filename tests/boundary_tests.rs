//! Boundary Calculator Tests
//!
//! Tests for safe sweep boundary computation:
//! - min(unreadable, min immutable) - margin
//! - Unavailable authority → BoundaryUnavailable, never a guess
//! - Floor clamping

use std::sync::Arc;

use sweepkv::{InMemoryTimestampAuthority, SweepBoundaryCalculator, SweepError, MIN_VALID_TIMESTAMP};

fn calculator(authority: Arc<InMemoryTimestampAuthority>, margin: u64) -> SweepBoundaryCalculator {
    SweepBoundaryCalculator::new(authority, margin)
}

#[test]
fn test_boundary_is_min_of_inputs_less_margin() {
    let authority = Arc::new(InMemoryTimestampAuthority::new(1000));
    authority.set_minimum_immutable_timestamp(Some(800));

    let calc = calculator(authority.clone(), 5);
    assert_eq!(calc.sweep_boundary().unwrap(), 795);

    // Once the live transaction finishes, the unreadable timestamp binds
    authority.set_minimum_immutable_timestamp(Some(2000));
    assert_eq!(calc.sweep_boundary().unwrap(), 995);
}

#[test]
fn test_boundary_without_live_transactions_uses_unreadable() {
    let authority = Arc::new(InMemoryTimestampAuthority::new(500));
    authority.set_minimum_immutable_timestamp(None);

    assert_eq!(calculator(authority, 0).sweep_boundary().unwrap(), 500);
}

#[test]
fn test_boundary_never_drops_below_timestamp_floor() {
    let authority = Arc::new(InMemoryTimestampAuthority::new(3));
    authority.set_minimum_immutable_timestamp(Some(2));

    // 2 - 10 saturates, then clamps to the smallest valid timestamp
    assert_eq!(
        calculator(authority, 10).sweep_boundary().unwrap(),
        MIN_VALID_TIMESTAMP
    );
}

#[test]
fn test_unreachable_authority_signals_unavailable() {
    let authority = Arc::new(InMemoryTimestampAuthority::new(1000));
    authority.set_unavailable(true);

    match calculator(authority, 5).sweep_boundary() {
        Err(SweepError::BoundaryUnavailable(_)) => {}
        other => panic!("expected BoundaryUnavailable, got {:?}", other),
    }
}

#[test]
fn test_boundary_grows_as_transactions_finish() {
    let authority = Arc::new(InMemoryTimestampAuthority::new(1000));
    authority.set_minimum_immutable_timestamp(Some(600));
    let calc = calculator(authority.clone(), 0);

    let first = calc.sweep_boundary().unwrap();
    authority.set_minimum_immutable_timestamp(Some(900));
    authority.set_unreadable_timestamp(1500);
    let second = calc.sweep_boundary().unwrap();

    assert!(second > first, "boundary may only increase over time");
}
