//! File-backed geofence sink writing one JSON object per line.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{GeofenceRecord, GeofenceSink, RegionId, SchedulerError};

/// Sink that keeps geofence records in a JSON-lines file.
///
/// The file is rewritten through a temporary sibling and renamed into place,
/// so readers never see a half-written file.
pub struct JsonLinesGeofenceSink {
    path: PathBuf,
}

impl JsonLinesGeofenceSink {
    /// Sink writing to `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back all records currently in the file.
    pub fn read_all(&self) -> Result<Vec<GeofenceRecord>, SchedulerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| SchedulerError::Parse {
                origin: self.path.display().to_string(),
                line: idx + 1,
                message: e.to_string(),
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn write_records<'a>(
        &self,
        records: impl ExactSizeIterator<Item = &'a GeofenceRecord>,
    ) -> Result<(), SchedulerError> {
        let count = records.len();
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for record in records {
                serde_json::to_writer(&mut writer, record)
                    .map_err(|e| SchedulerError::Backend(format!("encode geofence record: {e}")))?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!("wrote {} geofence records to {}", count, self.path.display());
        Ok(())
    }
}

impl GeofenceSink for JsonLinesGeofenceSink {
    fn upsert(&mut self, records: Vec<GeofenceRecord>) -> Result<(), SchedulerError> {
        let mut merged: BTreeMap<(RegionId, usize), GeofenceRecord> = self
            .read_all()?
            .into_iter()
            .map(|r| ((r.region_id, r.vertex_index), r))
            .collect();
        for record in records {
            merged.insert((record.region_id, record.vertex_index), record);
        }
        self.write_records(merged.values())
    }

    fn replace_all(&mut self, records: Vec<GeofenceRecord>) -> Result<(), SchedulerError> {
        let keyed: BTreeMap<(RegionId, usize), GeofenceRecord> = records
            .into_iter()
            .map(|r| ((r.region_id, r.vertex_index), r))
            .collect();
        self.write_records(keyed.values())
    }
}
