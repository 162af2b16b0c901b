//! Tests for configuration validation

use geolease::config::{
    AccountConfig, AccountSetConfig, AppConfig, GeofenceConfig, DEFAULT_MAX_SPEED_KMPH,
};

fn account(identifier: &str) -> AccountConfig {
    AccountConfig {
        identifier: identifier.into(),
        credentials: serde_json::Value::Null,
        blocked: false,
    }
}

#[test]
fn test_set_config_validation() {
    let valid = AccountSetConfig {
        max_speed_kmph: 35.0,
        accounts: vec![account("a"), account("b")],
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_set_config_invalid_speed() {
    for speed in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let invalid = AccountSetConfig {
            max_speed_kmph: speed,
            accounts: vec![account("a")],
        };
        assert!(invalid.validate().is_err(), "speed {speed} accepted");
    }
}

#[test]
fn test_set_config_requires_accounts() {
    let invalid = AccountSetConfig {
        max_speed_kmph: 35.0,
        accounts: Vec::new(),
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_set_config_rejects_blank_identifier() {
    let invalid = AccountSetConfig {
        max_speed_kmph: 35.0,
        accounts: vec![account("a"), account("  ")],
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("#1"), "{err}");
}

#[test]
fn test_app_config_from_json() {
    let json = r#"{
        "geofence": { "allowed_path": "/tmp/allowed.txt" },
        "sets": {
            "scouts": {
                "accounts": [
                    { "identifier": "scout-1", "credentials": { "password": "x" } },
                    { "identifier": "scout-2", "blocked": true }
                ]
            },
            "hunters": { "max_speed_kmph": 60.0, "accounts": [{ "identifier": "h-1" }] }
        }
    }"#;

    let cfg = AppConfig::from_json_str(json).unwrap();
    let scouts = &cfg.sets["scouts"];
    assert!((scouts.max_speed_kmph - DEFAULT_MAX_SPEED_KMPH).abs() < f64::EPSILON);
    assert_eq!(scouts.accounts.len(), 2);
    assert!(scouts.accounts[1].blocked);
    assert_eq!(scouts.accounts[0].credentials["password"], "x");
    assert!((cfg.sets["hunters"].max_speed_kmph - 60.0).abs() < f64::EPSILON);
    assert!(cfg.geofence.forbidden_path.is_none());
}

#[test]
fn test_app_config_requires_sets() {
    let err = AppConfig::from_json_str(r#"{ "sets": {} }"#).unwrap_err();
    assert!(err.contains("at least one"), "{err}");
}

#[test]
fn test_app_config_rejects_shared_identifier() {
    let mut cfg = AppConfig {
        geofence: GeofenceConfig::default(),
        sets: Default::default(),
    };
    for name in ["one", "two"] {
        cfg.sets.insert(
            name.into(),
            AccountSetConfig {
                max_speed_kmph: 35.0,
                accounts: vec![account("shared")],
            },
        );
    }
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("shared"), "{err}");
}

#[test]
fn test_app_config_parse_error() {
    let err = AppConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"), "{err}");
}
