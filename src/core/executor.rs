//! Work executed while holding an account lease.

use async_trait::async_trait;

use crate::core::account_pool::AccountLease;
use crate::core::geo::Coordinate;

/// How leased work ended, which decides what happens to the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseOutcome<T> {
    /// Work finished; the account goes back to its set.
    Completed(T),
    /// The remote service rejected the account; it is blocked for good.
    AccountRejected(String),
}

/// Abstraction for remote work performed with a leased account.
///
/// The scheduler never calls the remote service itself. Implementors log in
/// with [`AccountLease::credentials`], do their requests at `target`, and
/// report whether the account is still usable.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use geolease::core::{AccountLease, Coordinate, LeaseExecutor, LeaseOutcome};
///
/// #[derive(Clone)]
/// struct ScanExecutor;
///
/// #[async_trait]
/// impl LeaseExecutor<usize> for ScanExecutor {
///     async fn execute(&self, lease: &AccountLease, target: Coordinate) -> LeaseOutcome<usize> {
///         // log in, query around `target`, count results...
///         LeaseOutcome::Completed(0)
///     }
/// }
/// ```
#[async_trait]
pub trait LeaseExecutor<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Perform the work for `target` using `lease`.
    async fn execute(&self, lease: &AccountLease, target: Coordinate) -> LeaseOutcome<T>;
}
