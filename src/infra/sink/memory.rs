//! In-memory geofence sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{GeofenceRecord, GeofenceSink, RegionId, SchedulerError};

/// Sink keyed by `(region_id, vertex_index)`.
///
/// Clones share storage so tests can inspect what the store wrote.
#[derive(Clone, Default)]
pub struct InMemoryGeofenceSink {
    records: Arc<Mutex<BTreeMap<(RegionId, usize), GeofenceRecord>>>,
}

impl InMemoryGeofenceSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records ordered by region then vertex.
    pub fn records(&self) -> Vec<GeofenceRecord> {
        self.records.lock().values().cloned().collect()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl GeofenceSink for InMemoryGeofenceSink {
    fn upsert(&mut self, records: Vec<GeofenceRecord>) -> Result<(), SchedulerError> {
        let mut stored = self.records.lock();
        for record in records {
            stored.insert((record.region_id, record.vertex_index), record);
        }
        Ok(())
    }

    fn replace_all(&mut self, records: Vec<GeofenceRecord>) -> Result<(), SchedulerError> {
        let mut stored = self.records.lock();
        stored.clear();
        for record in records {
            stored.insert((record.region_id, record.vertex_index), record);
        }
        Ok(())
    }
}
