//! Tests for worker poll helpers

use std::time::Duration;

use geolease::core::{AccountScheduler, AccountSpec, Coordinate, Credentials, SchedulerError};
use geolease::runtime::{acquire_with_backoff, PollPolicy};

#[test]
fn test_poll_policy_default() {
    let policy = PollPolicy::default();
    assert_eq!(policy.interval, Duration::from_secs(5));
    assert_eq!(policy.max_attempts, 12);
}

#[tokio::test]
async fn test_zero_attempts_still_tries_once() {
    let scheduler = AccountScheduler::new();
    scheduler
        .create_set("s", 35.0, vec![AccountSpec::new("a", Credentials::default())])
        .unwrap();

    let policy = PollPolicy::new(Duration::from_millis(1), 0);
    let lease = acquire_with_backoff(&scheduler, "s", Coordinate::new(0.0, 0.0), &policy)
        .await
        .unwrap();
    assert_eq!(lease.unwrap().identifier(), "a");
}

#[tokio::test]
async fn test_unknown_set_fails_fast() {
    let scheduler = AccountScheduler::new();
    let policy = PollPolicy::new(Duration::from_secs(60), 100);
    let err = acquire_with_backoff(&scheduler, "ghosts", Coordinate::new(0.0, 0.0), &policy)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownSet(_)));
}
