//! Tests for audit sink

use geolease::core::{build_audit_event, AuditAction, AuditSink, Coordinate, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        "scout-1",
        "scouts",
        AuditAction::Acquire,
        Some(Coordinate::new(1.0, 2.0)),
        42,
    );

    sink.record(event.clone());
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], event);
    assert_eq!(events[0].account, "scout-1");
    assert_eq!(events[0].set_name, "scouts");
    assert_eq!(events[0].created_at_ms, 42);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("a", "s", AuditAction::Acquire, None, 1));
    sink.record(build_audit_event("b", "s", AuditAction::Release, None, 2));
    sink.record(build_audit_event("c", "s", AuditAction::Block, None, 3));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].account, "b"); // oldest dropped
    assert_eq!(events[1].account, "c");
}

#[test]
fn test_clones_share_buffer() {
    let sink = InMemoryAuditSink::new(4);
    let mut writer = sink.clone();
    writer.record(build_audit_event("a", "s", AuditAction::Acquire, None, 1));
    assert_eq!(sink.events().len(), 1);
}

#[test]
fn test_event_ids_unique() {
    let a = build_audit_event("a", "s", AuditAction::Acquire, None, 1);
    let b = build_audit_event("a", "s", AuditAction::Acquire, None, 1);
    assert_ne!(a.event_id, b.event_id);
}

#[test]
fn test_action_serializes_snake_case() {
    let event = build_audit_event("a", "s", AuditAction::Release, None, 7);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "release");
    assert_eq!(json["location"], serde_json::Value::Null);
}
