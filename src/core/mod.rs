//! Core geometry, geofencing, and account scheduling.

pub mod error;
pub mod geo;
pub mod geofence;
pub mod account_pool;
pub mod audit;
pub mod executor;

pub use error::{AppResult, SchedulerError};
pub use geo::{
    distance_km, point_in_polygon, within_radius_km, BoundingBox, Coordinate, Polygon,
    EARTH_RADIUS_KM,
};
pub use geofence::{
    parse_regions, GeofenceRecord, GeofenceRegistry, GeofenceSink, GeofenceStore, Region,
    RegionId,
};
pub use account_pool::{
    AccountLease, AccountScheduler, AccountSpec, AccountState, Credentials, LeaseGuard,
    SetSnapshot,
};
pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use executor::{LeaseExecutor, LeaseOutcome};
