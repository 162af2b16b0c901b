//! Named polygonal regions and point classification against them.
//!
//! Regions come from two line-oriented sources, one allowed and one
//! forbidden. A point passes the fence when it lies in at least one allowed
//! region and in no forbidden region. A source with no regions places no
//! constraint, so with nothing loaded the fence lets everything through.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::core::geo::{point_in_polygon, Coordinate, Polygon};
use crate::core::SchedulerError;

/// Identifier assigned to a region in load order.
pub type RegionId = u32;

/// One named polygon, flagged allowed or forbidden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    /// Position in the shared allowed-then-forbidden load sequence, from 1.
    pub id: RegionId,
    /// Name taken from the `[name]` header line.
    pub name: String,
    /// Region outline.
    pub polygon: Polygon,
    /// Whether points inside are rejected.
    pub forbidden: bool,
}

/// One vertex of one region, flattened for persistent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRecord {
    /// Owning region id.
    pub region_id: RegionId,
    /// Owning region name.
    pub name: String,
    /// Whether the owning region is forbidden.
    pub forbidden: bool,
    /// Zero-based vertex position within the polygon.
    pub vertex_index: usize,
    /// Vertex latitude.
    pub latitude: f64,
    /// Vertex longitude.
    pub longitude: f64,
}

/// External sink receiving the flattened registry after each load.
pub trait GeofenceSink: Send {
    /// Insert or replace records keyed by `(region_id, vertex_index)`.
    fn upsert(&mut self, records: Vec<GeofenceRecord>) -> Result<(), SchedulerError>;

    /// Make `records` the entire stored content, dropping everything else.
    fn replace_all(&mut self, records: Vec<GeofenceRecord>) -> Result<(), SchedulerError>;
}

/// Immutable set of loaded regions keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeofenceRegistry {
    regions: BTreeMap<RegionId, Region>,
}

struct OpenRegion {
    name: String,
    header_line: usize,
    vertices: Vec<Coordinate>,
}

fn parse_vertex(text: &str, origin: &str, line: usize) -> Result<Coordinate, SchedulerError> {
    let parse_err = |message: String| SchedulerError::Parse {
        origin: origin.to_string(),
        line,
        message,
    };
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| parse_err(format!("expected `<lat>,<lon>`, got `{text}`")))?;
    let latitude = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| parse_err(format!("bad latitude `{}`: {e}", lat.trim())))?;
    let longitude = lon
        .trim()
        .parse::<f64>()
        .map_err(|e| parse_err(format!("bad longitude `{}`: {e}", lon.trim())))?;
    if !(latitude.is_finite() && longitude.is_finite()) {
        return Err(parse_err(format!("non-finite coordinate `{text}`")));
    }
    Ok(Coordinate::new(latitude, longitude))
}

fn close_region(
    open: OpenRegion,
    id: RegionId,
    forbidden: bool,
    origin: &str,
) -> Result<Region, SchedulerError> {
    let polygon = Polygon::new(open.vertices).map_err(|e| {
        SchedulerError::InvalidGeometry(format!(
            "region `{}` ({origin}, line {}): {e}",
            open.name, open.header_line
        ))
    })?;
    Ok(Region {
        id,
        name: open.name,
        polygon,
        forbidden,
    })
}

/// Parse one region source.
///
/// `next_id` is the shared counter: it is bumped once per `[name]` header and
/// the new value becomes that region's id. Blank lines are skipped; a vertex
/// before any header is an error.
pub fn parse_regions<I, S>(
    lines: I,
    forbidden: bool,
    origin: &str,
    next_id: &mut RegionId,
) -> Result<Vec<Region>, SchedulerError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut regions = Vec::new();
    let mut open: Option<(RegionId, OpenRegion)> = None;

    for (idx, raw) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or_else(|| SchedulerError::Parse {
                origin: origin.to_string(),
                line: line_no,
                message: format!("unterminated region header `{line}`"),
            })?;
            if let Some((id, finished)) = open.take() {
                regions.push(close_region(finished, id, forbidden, origin)?);
            }
            *next_id += 1;
            tracing::info!("found geofence `{}` in {}", name.trim(), origin);
            open = Some((
                *next_id,
                OpenRegion {
                    name: name.trim().to_string(),
                    header_line: line_no,
                    vertices: Vec::new(),
                },
            ));
            continue;
        }

        let vertex = parse_vertex(line, origin, line_no)?;
        match open.as_mut() {
            Some((_, region)) => region.vertices.push(vertex),
            None => {
                return Err(SchedulerError::Parse {
                    origin: origin.to_string(),
                    line: line_no,
                    message: "coordinate appears before any `[name]` header".into(),
                })
            }
        }
    }

    if let Some((id, finished)) = open {
        regions.push(close_region(finished, id, forbidden, origin)?);
    }
    Ok(regions)
}

impl GeofenceRegistry {
    /// Parse both sources into a fresh registry.
    ///
    /// Allowed regions get ids first; forbidden ids continue the same counter.
    pub fn load<A, F, SA, SF>(allowed: A, forbidden: F) -> Result<Self, SchedulerError>
    where
        A: IntoIterator<Item = SA>,
        F: IntoIterator<Item = SF>,
        SA: AsRef<str>,
        SF: AsRef<str>,
    {
        let mut next_id: RegionId = 0;
        let allowed = parse_regions(allowed, false, "allowed", &mut next_id)?;
        let forbidden = parse_regions(forbidden, true, "forbidden", &mut next_id)?;
        let registry = Self::from_regions(allowed.into_iter().chain(forbidden));

        let vertices: usize = registry
            .regions
            .values()
            .map(|r| r.polygon.vertices().len())
            .sum();
        tracing::info!(
            "loaded {} geofences ({} forbidden) with {} coordinates",
            registry.len(),
            registry.forbidden().count(),
            vertices
        );
        Ok(registry)
    }

    /// Read optional region files from disk and parse them.
    ///
    /// A `None` path contributes no regions.
    pub fn load_files(
        allowed: Option<&Path>,
        forbidden: Option<&Path>,
    ) -> Result<Self, SchedulerError> {
        let read = |path: Option<&Path>| -> Result<String, SchedulerError> {
            match path {
                Some(p) => Ok(std::fs::read_to_string(p)?),
                None => Ok(String::new()),
            }
        };
        let allowed_text = read(allowed)?;
        let forbidden_text = read(forbidden)?;
        Self::load(allowed_text.lines(), forbidden_text.lines())
    }

    /// Build a registry from already-constructed regions.
    pub fn from_regions(regions: impl IntoIterator<Item = Region>) -> Self {
        Self {
            regions: regions.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Number of regions of both kinds.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when nothing is loaded, which disables filtering.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region by id.
    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// All regions in id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Allowed regions in id order.
    pub fn allowed(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(|r| !r.forbidden)
    }

    /// Forbidden regions in id order.
    pub fn forbidden(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(|r| r.forbidden)
    }

    /// Whether a single point passes the fence.
    ///
    /// The point must sit in some allowed region and in none of the
    /// forbidden ones; a forbidden region always wins over an overlapping
    /// allowed one. Without any allowed regions the whole map counts as
    /// allowed, so an empty registry admits everything.
    pub fn admits(&self, p: Coordinate) -> bool {
        let mut allowed = self.allowed().peekable();
        let in_allowed =
            allowed.peek().is_none() || allowed.any(|r| point_in_polygon(p, &r.polygon));
        in_allowed && !self.forbidden().any(|r| point_in_polygon(p, &r.polygon))
    }

    /// Keep the points that pass the fence, in input order.
    pub fn classify(&self, points: &[Coordinate]) -> Vec<Coordinate> {
        if self.regions.is_empty() {
            return points.to_vec();
        }
        points.iter().copied().filter(|p| self.admits(*p)).collect()
    }

    /// Keep the items whose coordinate passes the fence, in input order.
    pub fn filter_by<T, F>(&self, items: impl IntoIterator<Item = T>, mut location: F) -> Vec<T>
    where
        F: FnMut(&T) -> Coordinate,
    {
        items
            .into_iter()
            .filter(|item| self.admits(location(item)))
            .collect()
    }

    /// One record per (region, vertex) pair.
    pub fn to_records(&self) -> Vec<GeofenceRecord> {
        self.regions
            .values()
            .flat_map(|region| {
                region
                    .polygon
                    .vertices()
                    .iter()
                    .enumerate()
                    .map(move |(vertex_index, v)| GeofenceRecord {
                        region_id: region.id,
                        name: region.name.clone(),
                        forbidden: region.forbidden,
                        vertex_index,
                        latitude: v.latitude,
                        longitude: v.longitude,
                    })
            })
            .collect()
    }
}

/// Shared holder of the current registry.
///
/// Readers clone an `Arc` to the current registry and classify without
/// holding any lock. [`GeofenceStore::load`] parses the new sources fully
/// before swapping the pointer, so readers see either the old or the new
/// registry, never a partial one.
pub struct GeofenceStore {
    current: RwLock<Arc<GeofenceRegistry>>,
    sink: Option<Mutex<Box<dyn GeofenceSink>>>,
}

impl Default for GeofenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GeofenceStore {
    /// Store holding an empty registry (no filtering).
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(GeofenceRegistry::default())),
            sink: None,
        }
    }

    /// Store starting from an existing registry.
    pub fn with_registry(registry: GeofenceRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
            sink: None,
        }
    }

    /// Attach a write-through sink for loaded registries.
    pub fn with_sink(mut self, sink: Box<dyn GeofenceSink>) -> Self {
        self.sink = Some(Mutex::new(sink));
        self
    }

    /// Current registry.
    pub fn snapshot(&self) -> Arc<GeofenceRegistry> {
        Arc::clone(&self.current.read())
    }

    /// Parse both sources and replace the current registry wholesale.
    ///
    /// On a parse or geometry error the previous registry stays in place.
    pub fn load<A, F, SA, SF>(
        &self,
        allowed: A,
        forbidden: F,
    ) -> Result<Arc<GeofenceRegistry>, SchedulerError>
    where
        A: IntoIterator<Item = SA>,
        F: IntoIterator<Item = SF>,
        SA: AsRef<str>,
        SF: AsRef<str>,
    {
        let registry = GeofenceRegistry::load(allowed, forbidden)?;
        self.publish(registry)
    }

    /// Replace the current registry and write it through to the sink.
    ///
    /// The sink content is replaced wholesale, like the registry. The sink
    /// lock is held across the swap and the write, so concurrent publishes
    /// leave the sink matching whichever registry was published last. The
    /// registry is published before the sink runs; a sink failure is
    /// returned but does not roll the swap back.
    pub fn publish(
        &self,
        registry: GeofenceRegistry,
    ) -> Result<Arc<GeofenceRegistry>, SchedulerError> {
        let registry = Arc::new(registry);
        let Some(sink) = &self.sink else {
            *self.current.write() = Arc::clone(&registry);
            return Ok(registry);
        };

        let mut sink = sink.lock();
        *self.current.write() = Arc::clone(&registry);
        let records = registry.to_records();
        let count = records.len();
        if let Err(e) = sink.replace_all(records) {
            tracing::warn!("geofence sink rejected {} records: {}", count, e);
            return Err(e);
        }
        tracing::debug!("geofence sink now holds {} records", count);
        Ok(registry)
    }

    /// Filter points against the current registry.
    pub fn classify(&self, points: &[Coordinate]) -> Vec<Coordinate> {
        self.snapshot().classify(points)
    }
}
