//! Tests for geofence sinks

use geolease::core::{GeofenceRecord, GeofenceRegistry, GeofenceSink, SchedulerError};
use geolease::infra::{InMemoryGeofenceSink, JsonLinesGeofenceSink};

fn records() -> Vec<GeofenceRecord> {
    GeofenceRegistry::load(
        ["[Square]", "0,0", "0,10", "10,10", "10,0"],
        ["[Inner]", "4,4", "4,6", "6,6"],
    )
    .unwrap()
    .to_records()
}

#[test]
fn test_memory_sink_upserts_by_key() {
    let sink = InMemoryGeofenceSink::new();
    let mut writer = sink.clone();
    assert!(sink.is_empty());

    writer.upsert(records()).unwrap();
    assert_eq!(sink.len(), 7);

    let mut moved = records();
    moved[0].latitude = -1.0;
    writer.upsert(moved).unwrap();
    assert_eq!(sink.len(), 7);
    assert!((sink.records()[0].latitude + 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_jsonl_sink_writes_and_merges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geofences.jsonl");
    let mut sink = JsonLinesGeofenceSink::new(&path);
    assert_eq!(sink.path(), path.as_path());
    assert!(sink.read_all().unwrap().is_empty());

    let all = records();
    sink.upsert(all[..4].to_vec()).unwrap();
    sink.upsert(all[4..].to_vec()).unwrap();

    let stored = sink.read_all().unwrap();
    assert_eq!(stored, all);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 7);
    assert!(!path.with_extension("jsonl.tmp").exists());
}

#[test]
fn test_jsonl_sink_reports_corrupt_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geofences.jsonl");
    std::fs::write(&path, "{\"region_id\":1}\n").unwrap();
    let sink = JsonLinesGeofenceSink::new(&path);
    let err = sink.read_all().unwrap_err();
    assert!(matches!(err, SchedulerError::Parse { line: 1, .. }));
}

#[test]
fn test_memory_sink_replace_all_drops_stale_records() {
    let sink = InMemoryGeofenceSink::new();
    let mut writer = sink.clone();
    writer.upsert(records()).unwrap();

    let square_only = records()[..4].to_vec();
    writer.replace_all(square_only.clone()).unwrap();
    assert_eq!(sink.records(), square_only);
}

#[test]
fn test_jsonl_sink_replace_all_drops_stale_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geofences.jsonl");
    let mut sink = JsonLinesGeofenceSink::new(&path);

    sink.upsert(records()).unwrap();
    assert_eq!(sink.read_all().unwrap().len(), 7);

    let square_only = records()[..4].to_vec();
    sink.replace_all(square_only.clone()).unwrap();
    assert_eq!(sink.read_all().unwrap(), square_only);
    assert!(sink.read_all().unwrap().iter().all(|r| !r.forbidden));
}
