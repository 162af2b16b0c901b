//! Planar geo math: coordinates, distances, and polygon containment.
//!
//! Distances use the equirectangular approximation, which is accurate enough
//! for travel-feasibility checks over tens of kilometres and much cheaper than
//! a full great-circle formula. Containment uses the even-odd rule with the
//! ray cast towards increasing latitude.

use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A raw latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
}

impl Coordinate {
    /// Construct a coordinate without normalization.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Axis-aligned bounds of a polygon, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southernmost latitude.
    pub min_lat: f64,
    /// Northernmost latitude.
    pub max_lat: f64,
    /// Westernmost longitude.
    pub min_lon: f64,
    /// Easternmost longitude.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Bounds of a vertex list; `None` when empty.
    pub fn of(vertices: &[Coordinate]) -> Option<Self> {
        let first = vertices.first()?;
        let init = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };
        Some(vertices.iter().skip(1).fold(init, |b, v| Self {
            min_lat: b.min_lat.min(v.latitude),
            max_lat: b.max_lat.max(v.latitude),
            min_lon: b.min_lon.min(v.longitude),
            max_lon: b.max_lon.max(v.longitude),
        }))
    }

    /// Whether `p` lies within the box.
    pub fn contains(&self, p: Coordinate) -> bool {
        p.latitude >= self.min_lat
            && p.latitude <= self.max_lat
            && p.longitude >= self.min_lon
            && p.longitude <= self.max_lon
    }
}

/// Closed polygon with at least three vertices and cached bounds.
///
/// Vertex order defines the edges; the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    vertices: Vec<Coordinate>,
    bounds: BoundingBox,
}

impl Polygon {
    /// Build a polygon, rejecting fewer than three vertices or any
    /// non-finite vertex.
    pub fn new(vertices: Vec<Coordinate>) -> Result<Self, SchedulerError> {
        if vertices.len() < 3 {
            return Err(SchedulerError::InvalidGeometry(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(bad) = vertices
            .iter()
            .find(|v| !(v.latitude.is_finite() && v.longitude.is_finite()))
        {
            return Err(SchedulerError::InvalidGeometry(format!(
                "polygon vertex {bad:?} is not finite"
            )));
        }
        let bounds = BoundingBox::of(&vertices).ok_or_else(|| {
            SchedulerError::InvalidGeometry("polygon has no vertices".into())
        })?;
        Ok(Self { vertices, bounds })
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Precomputed bounding box.
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Even-odd containment test; see [`point_in_polygon`].
    pub fn contains(&self, p: Coordinate) -> bool {
        point_in_polygon(p, self)
    }
}

/// Equirectangular distance between two coordinates in kilometres.
///
/// Symmetric, and zero only when both coordinates coincide.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let x = d_lon * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;
    x.hypot(y) * EARTH_RADIUS_KM
}

/// Whether `b` is within `radius_km` of `a`.
pub fn within_radius_km(a: Coordinate, b: Coordinate, radius_km: f64) -> bool {
    distance_km(a, b) <= radius_km
}

/// Ray-casting point-in-polygon test.
///
/// Points outside the bounding box are rejected without walking the edges.
/// Points exactly on an edge or vertex get whatever the parity yields.
#[allow(clippy::float_cmp)]
pub fn point_in_polygon(p: Coordinate, polygon: &Polygon) -> bool {
    if !polygon.bounds.contains(p) {
        return false;
    }

    let vertices = &polygon.vertices;
    let n = vertices.len();
    let mut inside = false;

    for i in 0..n {
        let v1 = vertices[i];
        let v2 = vertices[(i + 1) % n];
        let (lat1, lon1) = (v1.latitude, v1.longitude);
        let (lat2, lon2) = (v2.latitude, v2.longitude);

        let brackets = lon1.min(lon2) < p.longitude && p.longitude <= lon1.max(lon2);
        if !brackets || p.latitude > lat1.max(lat2) {
            continue;
        }

        if lat1 == lat2 {
            inside = !inside;
            continue;
        }

        // lon1 != lon2 here: the strict bracket above excludes vertical edges.
        let crossing = (p.longitude - lon1) * (lat2 - lat1) / (lon2 - lon1) + lat1;
        if p.latitude <= crossing {
            inside = !inside;
        }
    }

    inside
}
