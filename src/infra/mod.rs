//! Infrastructure adapters for persisting loaded geofences.

pub mod sink;

pub use sink::{InMemoryGeofenceSink, JsonLinesGeofenceSink};
