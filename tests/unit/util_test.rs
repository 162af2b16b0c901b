//! Tests for utility functions

use std::time::Duration;

use geolease::util::clock::{now_ms, Clock, ManualClock, SystemClock};
use geolease::util::telemetry::init_tracing;

#[test]
fn test_now_ms() {
    let t1 = now_ms();
    std::thread::sleep(Duration::from_millis(10));
    let t2 = now_ms();
    assert!(t2 > t1);
    assert!(SystemClock.now_ms() >= t2);
}

#[test]
fn test_manual_clock_advance() {
    let clock = ManualClock::new(0);
    clock.advance(Duration::from_secs(11_400));
    assert_eq!(clock.now_ms(), 11_400_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}
