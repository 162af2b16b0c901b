//! Configuration models for account sets and geofence sources.

pub mod app;

pub use app::{
    AccountConfig, AccountSetConfig, AppConfig, GeofenceConfig, CONFIG_ENV_VAR,
    DEFAULT_MAX_SPEED_KMPH,
};
