//! Router Session Tests
//!
//! Replay semantics: terminal states, realized-cash accounting, capacity
//! limits and monotone fills.

use crate::router::allocator::AllocationSearch;
use crate::router::config::RouterConfig;
use crate::router::error::RouterError;
use crate::router::session::{average_price, RouterSession, SessionState};
use crate::router::venue::{Qty, Snapshot, VenueQuote};
use std::collections::HashMap;

// =============================================================================
// HELPERS
// =============================================================================

fn quote(venue: &str, ask: f64, size: Qty) -> VenueQuote {
    VenueQuote::new(venue, ask, size, 0.003, 0.002)
}

fn config() -> RouterConfig {
    RouterConfig::new(0.001, 0.001, 0.0001)
}

/// Underfill penalty well above the unit cost, so partial fills pay.
fn eager_config() -> RouterConfig {
    RouterConfig::new(0.0, 50.0, 0.0)
}

fn session(order_size: Qty) -> RouterSession {
    RouterSession::new(order_size, config(), AllocationSearch::default()).unwrap()
}

fn eager_session(order_size: Qty) -> RouterSession {
    RouterSession::new(order_size, eager_config(), AllocationSearch::default()).unwrap()
}

/// Five snapshots, 1s apart, with thin and shifting liquidity.
fn replay_tape() -> Vec<Snapshot> {
    (0..5)
        .map(|i| {
            Snapshot::new(
                1_000_000_000 * (i + 1),
                vec![
                    quote("A", 10.00 + i as f64 * 0.01, 200 + 50 * i),
                    quote("B", 10.02, 100),
                    quote("C", 9.99, if i % 2 == 0 { 0 } else { 300 }),
                ],
            )
        })
        .collect()
}

// =============================================================================
// TERMINAL STATES
// =============================================================================

#[test]
fn test_single_snapshot_fill() {
    let snap = Snapshot::new(1, vec![quote("A", 10.00, 200), quote("B", 10.02, 200)]);
    let result = RouterSession::replay(300, config(), AllocationSearch::default(), &[snap]).unwrap();

    assert_eq!(result.state, SessionState::Filled);
    assert_eq!(result.filled_shares, 300);
    assert!((result.total_cost - 3002.9).abs() < 1e-9);
    assert!((result.avg_price - 3002.9 / 300.0).abs() < 1e-12);
    assert_eq!(result.snapshots_processed, 1);
}

#[test]
fn test_stops_consuming_after_fill() {
    let mut s = session(300);
    let snaps = vec![
        Snapshot::new(1, vec![quote("A", 10.00, 300)]),
        Snapshot::new(2, vec![quote("A", 1.00, 300)]),
    ];
    assert_eq!(s.step(&snaps[0]).unwrap(), SessionState::Filled);
    assert_eq!(s.step(&snaps[1]).unwrap(), SessionState::Filled);

    let result = s.finish();
    assert_eq!(result.snapshots_processed, 1);
    assert!((result.total_cost - 300.0 * 10.003).abs() < 1e-9);
}

#[test]
fn test_exhausted_when_liquidity_runs_out() {
    let snaps = vec![
        Snapshot::new(1, vec![quote("A", 10.00, 200)]),
        Snapshot::new(2, vec![quote("A", 10.01, 100)]),
    ];
    let result = RouterSession::replay(1000, eager_config(), AllocationSearch::default(), &snaps).unwrap();

    assert_eq!(result.state, SessionState::Exhausted);
    assert_eq!(result.filled_shares, 300);
    assert_eq!(result.snapshots_processed, 2);
}

#[test]
fn test_light_penalties_wait_for_full_remainder() {
    let snaps = vec![
        Snapshot::new(1, vec![quote("A", 10.00, 200)]),
        Snapshot::new(2, vec![quote("A", 10.05, 1000)]),
    ];
    let mut s = session(500);
    assert_eq!(s.step(&snaps[0]).unwrap(), SessionState::Running);
    assert_eq!(s.ledger().filled_shares, 0);
    assert!(s.fills().is_empty());

    let result = s.run(&snaps[1..]).unwrap();
    assert_eq!(result.state, SessionState::Filled);
    assert_eq!(result.filled_shares, 500);
    assert!((result.avg_price - 10.053).abs() < 1e-12);
    assert_eq!(result.snapshots_processed, 2);
}

#[test]
fn test_light_penalties_thin_book_exhausts_without_fills() {
    let snaps = vec![
        Snapshot::new(1, vec![quote("A", 10.00, 200)]),
        Snapshot::new(2, vec![quote("A", 10.01, 100)]),
    ];
    let result = RouterSession::replay(1000, config(), AllocationSearch::default(), &snaps).unwrap();
    assert_eq!(result.state, SessionState::Exhausted);
    assert_eq!(result.filled_shares, 0);
    assert_eq!(result.avg_price, 0.0);
}

#[test]
fn test_empty_replay_is_exhausted_not_error() {
    let result = RouterSession::replay(500, config(), AllocationSearch::default(), &[]).unwrap();
    assert_eq!(result.state, SessionState::Exhausted);
    assert_eq!(result.filled_shares, 0);
    assert_eq!(result.total_cost, 0.0);
    assert_eq!(result.avg_price, 0.0);
}

#[test]
fn test_zero_order_is_filled() {
    let result = RouterSession::replay(0, config(), AllocationSearch::default(), &[]).unwrap();
    assert_eq!(result.state, SessionState::Filled);
    assert_eq!(result.avg_price, 0.0);
}

#[test]
fn test_no_liquidity_never_fills() {
    let snaps: Vec<Snapshot> = (0..3)
        .map(|t| Snapshot::new(t, vec![quote("A", 10.00, 0), quote("B", 10.01, 0)]))
        .collect();
    let result = RouterSession::replay(500, config(), AllocationSearch::default(), &snaps).unwrap();
    assert_eq!(result.state, SessionState::Exhausted);
    assert_eq!(result.filled_shares, 0);
    assert_eq!(result.avg_price, 0.0);
}

// =============================================================================
// ACCOUNTING
// =============================================================================

#[test]
fn test_ledger_books_cash_not_penalties() {
    // Heavy underfill penalty must not leak into realized cost.
    let heavy = RouterConfig::new(0.0, 50.0, 5.0);
    let snaps = vec![Snapshot::new(1, vec![quote("A", 10.00, 100)])];
    let result = RouterSession::replay(1000, heavy, AllocationSearch::default(), &snaps).unwrap();
    assert_eq!(result.filled_shares, 100);
    assert!((result.total_cost - 1000.3).abs() < 1e-9);
}

#[test]
fn test_fill_log_matches_ledger() {
    let mut s = eager_session(2000);
    for snap in replay_tape() {
        s.step(&snap).unwrap();
    }
    let fills_cash: f64 = s.fills().iter().map(|f| f.cash()).sum();
    let fills_qty: Qty = s.fills().iter().map(|f| f.quantity).sum();
    assert!((fills_cash - s.ledger().total_cost).abs() < 1e-6);
    assert_eq!(fills_qty, s.ledger().filled_shares);
    assert_eq!(s.ledger().remaining_quantity, 2000 - fills_qty);
}

#[test]
fn test_never_exceeds_quoted_size() {
    let tape = replay_tape();
    let mut s = eager_session(5000);
    for snap in &tape {
        s.step(snap).unwrap();
    }

    let quoted: HashMap<(i64, String), Qty> = tape
        .iter()
        .flat_map(|snap| {
            snap.venues
                .iter()
                .map(move |v| ((snap.timestamp, v.venue.clone()), v.ask_size))
        })
        .collect();
    for fill in s.fills() {
        let displayed = quoted[&(fill.timestamp, fill.venue.clone())];
        assert!(fill.quantity <= displayed, "{:?} exceeds displayed {}", fill, displayed);
        assert_eq!(fill.quantity % 100, 0);
    }
}

#[test]
fn test_filled_shares_monotone_and_bounded() {
    let order_size = 1500;
    let mut s = eager_session(order_size);
    let mut previous = 0;
    for snap in replay_tape() {
        s.step(&snap).unwrap();
        let filled = s.ledger().filled_shares;
        assert!(filled >= previous);
        assert!(filled <= order_size);
        previous = filled;
    }
    assert_eq!(s.state(), SessionState::Filled);
    assert_eq!(s.ledger().filled_shares, order_size);
}

#[test]
fn test_average_price_sentinel() {
    assert_eq!(average_price(0.0, 0), 0.0);
    assert_eq!(average_price(1000.0, 100), 10.0);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_invalid_quote_surfaces() {
    let snaps = vec![Snapshot::new(1, vec![quote("A", -10.00, 100)])];
    let err = RouterSession::replay(100, config(), AllocationSearch::default(), &snaps).unwrap_err();
    assert!(matches!(err, RouterError::InvalidInput { .. }));
}

#[test]
fn test_negative_order_rejected() {
    assert!(RouterSession::new(-1, config(), AllocationSearch::default()).is_err());
    assert!(RouterSession::new(100, RouterConfig::new(-1.0, 0.0, 0.0), AllocationSearch::default()).is_err());
}
