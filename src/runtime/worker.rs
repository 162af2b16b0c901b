//! Poll-based acquisition and scoped execution on a tokio runtime.
//!
//! The scheduler itself never waits. These helpers own the retry loop a
//! worker needs: ask for an account, sleep for roughly as long as the
//! shortest cooldown, ask again.

use std::time::Duration;

use crate::core::{
    AccountLease, AccountScheduler, Coordinate, LeaseExecutor, LeaseOutcome, SchedulerError,
};
use crate::util::clock::Clock;

/// Retry policy for [`acquire_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Longest sleep between attempts.
    pub interval: Duration,
    /// Total attempts, including the first; at least one is always made.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 12,
        }
    }
}

impl PollPolicy {
    /// Policy with the given interval and attempt budget.
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Result of [`run_leased`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome<T> {
    /// Work ran and the account was returned.
    Completed(T),
    /// No account became ready within the poll budget.
    Unavailable,
    /// Work ran but the account was rejected and is now blocked.
    AccountRejected {
        /// Blocked account.
        identifier: String,
        /// Reason reported by the executor.
        reason: String,
    },
}

/// Call [`AccountScheduler::acquire`] until it yields a lease or the policy
/// runs out.
///
/// Between attempts the worker sleeps for the scheduler's cooldown hint,
/// capped at `policy.interval`.
pub async fn acquire_with_backoff<C: Clock>(
    scheduler: &AccountScheduler<C>,
    set_name: &str,
    target: Coordinate,
    policy: &PollPolicy,
) -> Result<Option<AccountLease>, SchedulerError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(lease) = scheduler.acquire(set_name, target)? {
            return Ok(Some(lease));
        }
        if attempt == attempts {
            break;
        }

        let delay = match scheduler.next_available_in(set_name, target)? {
            Some(wait) if !wait.is_zero() => wait.min(policy.interval),
            _ => policy.interval,
        };
        tracing::debug!(
            "no account in `{}` (attempt {}/{}), retrying in {:?}",
            set_name,
            attempt,
            attempts,
            delay
        );
        tokio::time::sleep(delay).await;
    }

    tracing::warn!("gave up waiting for an account in `{}`", set_name);
    Ok(None)
}

/// Lease an account, run `executor` with it, then return or block it.
///
/// The lease is held by a guard for the whole call, so the account is
/// released even if the future is dropped mid-flight.
pub async fn run_leased<C, T, E>(
    scheduler: &AccountScheduler<C>,
    set_name: &str,
    target: Coordinate,
    executor: &E,
    policy: &PollPolicy,
) -> Result<RunOutcome<T>, SchedulerError>
where
    C: Clock,
    T: Send + 'static,
    E: LeaseExecutor<T> + ?Sized,
{
    let Some(lease) = acquire_with_backoff(scheduler, set_name, target, policy).await? else {
        return Ok(RunOutcome::Unavailable);
    };
    let guard = scheduler.guard(lease);

    match executor.execute(guard.lease(), target).await {
        LeaseOutcome::Completed(value) => {
            drop(guard);
            Ok(RunOutcome::Completed(value))
        }
        LeaseOutcome::AccountRejected(reason) => {
            let identifier = guard.identifier().to_string();
            tracing::warn!("account {} rejected: {}", identifier, reason);
            guard.block()?;
            Ok(RunOutcome::AccountRejected { identifier, reason })
        }
    }
}
