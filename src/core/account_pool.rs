//! Speed-gated account leasing.
//!
//! An [`AccountScheduler`] owns named sets of accounts and hands out exclusive
//! leases. Each account remembers where and when it was last assigned; a new
//! assignment is only allowed once enough real time has passed to cover the
//! distance at the set's maximum travel speed.
//!
//! Per account the lifecycle is `Free -> Leased -> Free`, or
//! `Free -> Blocked`, where `Blocked` is terminal.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::geo::{distance_km, Coordinate};
use crate::core::SchedulerError;
use crate::util::clock::{Clock, SystemClock};

/// Opaque login material handed to whoever holds the lease.
///
/// The scheduler never inspects it; `Debug` output is redacted.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Arc<serde_json::Value>);

impl Credentials {
    /// Wrap arbitrary JSON credentials.
    pub fn new(value: serde_json::Value) -> Self {
        Self(Arc::new(value))
    }

    /// Underlying credential document.
    pub fn expose(&self) -> &serde_json::Value {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}

/// Externally supplied account definition.
#[derive(Debug, Clone)]
pub struct AccountSpec {
    /// Unique identifier (usually the username).
    pub identifier: String,
    /// Opaque credentials.
    pub credentials: Credentials,
    /// Start out blocked (already flagged by the remote service).
    pub blocked: bool,
}

impl AccountSpec {
    /// Unblocked account with the given credentials.
    pub fn new(identifier: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            identifier: identifier.into(),
            credentials,
            blocked: false,
        }
    }
}

/// Lease state of a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// Available for acquisition once cooldown allows.
    Free,
    /// Held by exactly one caller.
    Leased,
    /// Permanently excluded.
    Blocked,
}

#[derive(Debug)]
struct AccountResource {
    identifier: String,
    credentials: Credentials,
    state: AccountState,
    lease_id: Option<Uuid>,
    last_assigned_at_ms: Option<u128>,
    last_assigned_location: Option<Coordinate>,
}

impl AccountResource {
    /// Seconds still to wait before this account may appear at `target`.
    #[allow(clippy::cast_precision_loss)]
    fn cooldown_remaining_secs(&self, target: Coordinate, now_ms: u128, max_speed_kmph: f64) -> f64 {
        match (self.last_assigned_at_ms, self.last_assigned_location) {
            (Some(at), Some(from)) => {
                let elapsed = now_ms.saturating_sub(at) as f64 / 1000.0;
                let required = distance_km(from, target) / max_speed_kmph * 3600.0;
                (required - elapsed).max(0.0)
            }
            _ => 0.0,
        }
    }
}

struct AccountSet {
    max_speed_kmph: f64,
    members: Vec<AccountResource>,
}

#[derive(Default)]
struct SchedulerState {
    sets: HashMap<String, AccountSet>,
    /// identifier -> (set name, member index)
    index: HashMap<String, (String, usize)>,
}

impl SchedulerState {
    fn slot_mut(&mut self, set_name: &str, slot: usize) -> Option<&mut AccountResource> {
        self.sets.get_mut(set_name)?.members.get_mut(slot)
    }
}

/// Handle to a leased account.
///
/// Returned by [`AccountScheduler::acquire`]; hand it back through
/// [`AccountScheduler::release`] or [`AccountScheduler::release_blocked`].
#[derive(Debug, Clone, PartialEq)]
pub struct AccountLease {
    lease_id: Uuid,
    identifier: String,
    set_name: String,
    slot: usize,
    credentials: Credentials,
    target: Coordinate,
    acquired_at_ms: u128,
}

impl AccountLease {
    /// Unique id of this lease.
    pub const fn lease_id(&self) -> Uuid {
        self.lease_id
    }

    /// Account identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Set the account belongs to.
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Account credentials.
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Location the account was leased for.
    pub const fn target(&self) -> Coordinate {
        self.target
    }

    /// Clock reading at acquisition.
    pub const fn acquired_at_ms(&self) -> u128 {
        self.acquired_at_ms
    }
}

/// Per-set counts for dashboards and health checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSnapshot {
    /// Set name.
    pub name: String,
    /// Configured travel speed limit.
    pub max_speed_kmph: f64,
    /// Number of members.
    pub total: usize,
    /// Members not leased and not blocked.
    pub free: usize,
    /// Members currently leased.
    pub leased: usize,
    /// Members permanently blocked.
    pub blocked: usize,
}

/// Thread-safe pool of account sets with speed-gated leasing.
///
/// One mutex guards all sets. Every operation under it is a bounded scan
/// with no I/O, so contention stays short.
pub struct AccountScheduler<C: Clock = SystemClock> {
    state: Mutex<SchedulerState>,
    clock: C,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
}

impl Default for AccountScheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountScheduler<SystemClock> {
    /// Scheduler using wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> AccountScheduler<C> {
    /// Scheduler reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            clock,
            audit: None,
        }
    }

    /// Attach an audit sink.
    ///
    /// The sink is invoked while the scheduler lock is held and must not call
    /// back into the scheduler.
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Register a named set with a fixed membership.
    ///
    /// Fails with `InvalidState` for a duplicate set name or an identifier
    /// that is already registered, and with `InvalidConfig` for an empty
    /// membership or a speed that is not a positive finite number.
    pub fn create_set(
        &self,
        name: impl Into<String>,
        max_speed_kmph: f64,
        members: Vec<AccountSpec>,
    ) -> Result<(), SchedulerError> {
        let name = name.into();
        if !(max_speed_kmph.is_finite() && max_speed_kmph > 0.0) {
            return Err(SchedulerError::InvalidConfig(format!(
                "set `{name}`: max speed must be positive, got {max_speed_kmph}"
            )));
        }
        if members.is_empty() {
            return Err(SchedulerError::InvalidConfig(format!(
                "set `{name}` has no accounts"
            )));
        }

        let mut state = self.state.lock();
        if state.sets.contains_key(&name) {
            tracing::warn!("duplicate account set definition `{}`", name);
            return Err(SchedulerError::InvalidState(format!(
                "duplicate set definition `{name}`"
            )));
        }

        let mut seen = HashMap::with_capacity(members.len());
        for (slot, spec) in members.iter().enumerate() {
            if let Some((other, _)) = state.index.get(&spec.identifier) {
                return Err(SchedulerError::InvalidState(format!(
                    "account `{}` already registered in set `{other}`",
                    spec.identifier
                )));
            }
            if seen.insert(spec.identifier.clone(), slot).is_some() {
                return Err(SchedulerError::InvalidState(format!(
                    "account `{}` listed twice in set `{name}`",
                    spec.identifier
                )));
            }
        }

        let members: Vec<AccountResource> = members
            .into_iter()
            .map(|spec| AccountResource {
                identifier: spec.identifier,
                credentials: spec.credentials,
                state: if spec.blocked {
                    AccountState::Blocked
                } else {
                    AccountState::Free
                },
                lease_id: None,
                last_assigned_at_ms: None,
                last_assigned_location: None,
            })
            .collect();

        for (identifier, slot) in seen {
            state.index.insert(identifier, (name.clone(), slot));
        }
        tracing::info!(
            "registered account set `{}` with {} accounts at {} km/h",
            name,
            members.len(),
            max_speed_kmph
        );
        state.sets.insert(
            name,
            AccountSet {
                max_speed_kmph,
                members,
            },
        );
        Ok(())
    }

    /// Lease the first ready account of `set_name` for work at `target`.
    ///
    /// Members are scanned in registration order. Leased and blocked members
    /// are skipped, as are members whose last assignment is too recent to
    /// have travelled to `target` at the set's speed limit. `Ok(None)` means
    /// nothing is ready; callers retry on their own schedule.
    pub fn acquire(
        &self,
        set_name: &str,
        target: Coordinate,
    ) -> Result<Option<AccountLease>, SchedulerError> {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();
        let set = state
            .sets
            .get_mut(set_name)
            .ok_or_else(|| SchedulerError::UnknownSet(set_name.to_string()))?;
        let max_speed = set.max_speed_kmph;

        for (slot, account) in set.members.iter_mut().enumerate() {
            if account.state != AccountState::Free {
                continue;
            }
            let wait = account.cooldown_remaining_secs(target, now, max_speed);
            if wait > 0.0 {
                tracing::debug!(
                    "account {} cooling down for {:.0}s more before {:?}",
                    account.identifier,
                    wait,
                    target
                );
                continue;
            }

            let lease_id = Uuid::new_v4();
            account.state = AccountState::Leased;
            account.lease_id = Some(lease_id);
            account.last_assigned_at_ms = Some(now);
            account.last_assigned_location = Some(target);

            let lease = AccountLease {
                lease_id,
                identifier: account.identifier.clone(),
                set_name: set_name.to_string(),
                slot,
                credentials: account.credentials.clone(),
                target,
                acquired_at_ms: now,
            };
            self.record_audit(&lease.identifier, set_name, AuditAction::Acquire, Some(target));
            drop(state);

            tracing::info!("leased account {} from set `{}`", lease.identifier, set_name);
            return Ok(Some(lease));
        }

        drop(state);
        tracing::debug!("no account ready in set `{}`", set_name);
        Ok(None)
    }

    /// Lease an account that is released automatically when the guard drops.
    pub fn acquire_scoped(
        &self,
        set_name: &str,
        target: Coordinate,
    ) -> Result<Option<LeaseGuard<'_, C>>, SchedulerError> {
        Ok(self.acquire(set_name, target)?.map(|lease| self.guard(lease)))
    }

    /// Wrap an existing lease so it is released when the guard drops.
    pub fn guard(&self, lease: AccountLease) -> LeaseGuard<'_, C> {
        LeaseGuard {
            scheduler: self,
            lease,
            finished: false,
        }
    }

    /// Return a leased account to its set.
    ///
    /// Fails with `InvalidState` when this lease is no longer the account's
    /// current lease (double release, or a handle from an earlier lease).
    pub fn release(&self, lease: &AccountLease) -> Result<(), SchedulerError> {
        self.finish_lease(lease, AccountState::Free, AuditAction::Release)?;
        tracing::info!("released account {}", lease.identifier);
        Ok(())
    }

    /// Release a lease and block the account in the same critical section.
    ///
    /// Used when the work done under the lease revealed that the remote
    /// service flagged the account.
    pub fn release_blocked(&self, lease: &AccountLease) -> Result<(), SchedulerError> {
        self.finish_lease(lease, AccountState::Blocked, AuditAction::Block)?;
        tracing::warn!("account {} blocked while leased", lease.identifier);
        Ok(())
    }

    /// Permanently exclude a free account.
    pub fn mark_blocked(&self, identifier: &str) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let (set_name, slot) = state
            .index
            .get(identifier)
            .cloned()
            .ok_or_else(|| SchedulerError::InvalidState(format!("unknown account `{identifier}`")))?;
        let account = state
            .slot_mut(&set_name, slot)
            .ok_or_else(|| SchedulerError::InvalidState(format!("unknown account `{identifier}`")))?;
        match account.state {
            AccountState::Free => account.state = AccountState::Blocked,
            other => {
                return Err(SchedulerError::InvalidState(format!(
                    "cannot block account `{identifier}` in state {other:?}"
                )))
            }
        }
        self.record_audit(identifier, &set_name, AuditAction::Block, None);
        drop(state);

        tracing::warn!("account {} blocked", identifier);
        Ok(())
    }

    /// Current state of an account, if registered.
    pub fn account_state(&self, identifier: &str) -> Option<AccountState> {
        let state = self.state.lock();
        let (set_name, slot) = state.index.get(identifier)?;
        state
            .sets
            .get(set_name)
            .and_then(|s| s.members.get(*slot))
            .map(|a| a.state)
    }

    /// Shortest wait before some free member of `set_name` could serve
    /// `target`.
    ///
    /// `Some(Duration::ZERO)` means `acquire` would succeed now; `None` means
    /// every member is leased or blocked, so waiting alone will not help.
    /// A wait too long to represent saturates at [`Duration::MAX`].
    pub fn next_available_in(
        &self,
        set_name: &str,
        target: Coordinate,
    ) -> Result<Option<Duration>, SchedulerError> {
        let state = self.state.lock();
        let now = self.clock.now_ms();
        let set = state
            .sets
            .get(set_name)
            .ok_or_else(|| SchedulerError::UnknownSet(set_name.to_string()))?;

        let shortest = set
            .members
            .iter()
            .filter(|a| a.state == AccountState::Free)
            .map(|a| a.cooldown_remaining_secs(target, now, set.max_speed_kmph))
            .reduce(f64::min);
        Ok(shortest.map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)))
    }

    /// Counts per set, sorted by set name.
    pub fn snapshot(&self) -> Vec<SetSnapshot> {
        let state = self.state.lock();
        let mut snapshots: Vec<SetSnapshot> = state
            .sets
            .iter()
            .map(|(name, set)| {
                let count = |s: AccountState| set.members.iter().filter(|a| a.state == s).count();
                SetSnapshot {
                    name: name.clone(),
                    max_speed_kmph: set.max_speed_kmph,
                    total: set.members.len(),
                    free: count(AccountState::Free),
                    leased: count(AccountState::Leased),
                    blocked: count(AccountState::Blocked),
                }
            })
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    fn finish_lease(
        &self,
        lease: &AccountLease,
        next: AccountState,
        action: AuditAction,
    ) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let account = state
            .slot_mut(&lease.set_name, lease.slot)
            .filter(|a| a.identifier == lease.identifier)
            .ok_or_else(|| {
                SchedulerError::InvalidState(format!("unknown account `{}`", lease.identifier))
            })?;

        if account.state != AccountState::Leased || account.lease_id != Some(lease.lease_id) {
            tracing::warn!(
                "release of account {} with stale lease {}",
                lease.identifier,
                lease.lease_id
            );
            return Err(SchedulerError::InvalidState(format!(
                "account `{}` is not held by lease {}",
                lease.identifier, lease.lease_id
            )));
        }
        account.state = next;
        account.lease_id = None;
        self.record_audit(&lease.identifier, &lease.set_name, action, None);
        Ok(())
    }

    /// Called with the state lock held, so the audit log sees transitions
    /// in the order they happened.
    fn record_audit(
        &self,
        identifier: &str,
        set_name: &str,
        action: AuditAction,
        location: Option<Coordinate>,
    ) {
        if let Some(audit_sink) = &self.audit {
            let mut sink = audit_sink.lock();
            sink.record(build_audit_event(
                identifier,
                set_name,
                action,
                location,
                self.clock.now_ms(),
            ));
        }
    }
}

/// Lease that returns its account when dropped.
pub struct LeaseGuard<'a, C: Clock = SystemClock> {
    scheduler: &'a AccountScheduler<C>,
    lease: AccountLease,
    finished: bool,
}

impl<C: Clock> LeaseGuard<'_, C> {
    /// The underlying lease.
    pub const fn lease(&self) -> &AccountLease {
        &self.lease
    }

    /// Release and block the account instead of just releasing it.
    pub fn block(mut self) -> Result<(), SchedulerError> {
        self.finished = true;
        self.scheduler.release_blocked(&self.lease)
    }
}

impl<C: Clock> std::ops::Deref for LeaseGuard<'_, C> {
    type Target = AccountLease;

    fn deref(&self) -> &Self::Target {
        &self.lease
    }
}

impl<C: Clock> Drop for LeaseGuard<'_, C> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.scheduler.release(&self.lease) {
            tracing::error!("failed to release account {} on drop: {}", self.lease.identifier, e);
        }
    }
}
