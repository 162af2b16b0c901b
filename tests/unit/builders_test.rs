//! Tests for builder modules

use std::collections::BTreeMap;

use geolease::builders::{build_engine, build_geofence_store, build_scheduler};
use geolease::config::{AccountConfig, AccountSetConfig, AppConfig, GeofenceConfig};
use geolease::core::{AccountState, Coordinate, SchedulerError};
use geolease::util::clock::{ManualClock, SystemClock};

fn config() -> AppConfig {
    let mut sets = BTreeMap::new();
    sets.insert(
        "scouts".to_string(),
        AccountSetConfig {
            max_speed_kmph: 35.0,
            accounts: vec![
                AccountConfig {
                    identifier: "scout-1".into(),
                    credentials: serde_json::json!({ "password": "hunter2" }),
                    blocked: true,
                },
                AccountConfig {
                    identifier: "scout-2".into(),
                    credentials: serde_json::Value::Null,
                    blocked: false,
                },
            ],
        },
    );
    AppConfig {
        geofence: GeofenceConfig::default(),
        sets,
    }
}

#[test]
fn test_build_scheduler_registers_sets() {
    let scheduler = build_scheduler(&config(), ManualClock::new(0)).unwrap();
    assert_eq!(scheduler.account_state("scout-1"), Some(AccountState::Blocked));
    assert_eq!(scheduler.account_state("scout-2"), Some(AccountState::Free));

    let lease = scheduler
        .acquire("scouts", Coordinate::new(1.0, 1.0))
        .unwrap()
        .unwrap();
    assert_eq!(lease.identifier(), "scout-2");
}

#[test]
fn test_build_scheduler_rejects_invalid_config() {
    let mut cfg = config();
    cfg.sets.get_mut("scouts").unwrap().max_speed_kmph = 0.0;
    let err = build_scheduler(&cfg, SystemClock).err().unwrap();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[test]
fn test_build_geofence_store_without_files() {
    let store = build_geofence_store(&GeofenceConfig::default()).unwrap();
    assert!(store.snapshot().is_empty());
}

#[test]
fn test_build_engine_loads_geofences() {
    let dir = tempfile::tempdir().unwrap();
    let forbidden = dir.path().join("forbidden.txt");
    std::fs::write(&forbidden, "[Park]\n4,4\n4,6\n6,6\n6,4\n").unwrap();

    let mut cfg = config();
    cfg.geofence.forbidden_path = Some(forbidden);
    let engine = build_engine(&cfg, SystemClock).unwrap();

    assert_eq!(engine.geofence.snapshot().len(), 1);
    assert_eq!(
        engine
            .geofence
            .classify(&[Coordinate::new(5.0, 5.0), Coordinate::new(1.0, 1.0)]),
        vec![Coordinate::new(1.0, 1.0)]
    );
    assert_eq!(engine.scheduler.snapshot().len(), 1);
}

#[test]
fn test_build_engine_reports_context() {
    let mut cfg = config();
    cfg.geofence.allowed_path = Some("/nonexistent/allowed.txt".into());
    let err = build_engine(&cfg, SystemClock).err().unwrap();
    assert!(format!("{err:#}").contains("loading geofences"));
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
