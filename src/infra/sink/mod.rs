//! Geofence sink backends.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesGeofenceSink;
pub use memory::InMemoryGeofenceSink;
