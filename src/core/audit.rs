//! Audit trail for account lease transitions.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::geo::Coordinate;

/// Lease transition being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Account leased for a target location.
    Acquire,
    /// Lease returned.
    Release,
    /// Account permanently excluded.
    Block,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Account identifier.
    pub account: String,
    /// Account set name.
    pub set_name: String,
    /// What happened.
    pub action: AuditAction,
    /// Target location for acquisitions.
    pub location: Option<Coordinate>,
    /// Scheduler clock reading in milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit sink for testing and dev.
///
/// Clones share one buffer, so a caller can keep a handle after boxing a
/// clone into the scheduler.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Audit sink that forwards events to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(
            target: "geolease::audit",
            event_id = %event.event_id,
            account = %event.account,
            set = %event.set_name,
            action = ?event.action,
            "lease audit"
        );
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    account: impl Into<String>,
    set_name: impl Into<String>,
    action: AuditAction,
    location: Option<Coordinate>,
    created_at_ms: u128,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4(),
        account: account.into(),
        set_name: set_name.into(),
        action,
        location,
        created_at_ms,
    }
}
