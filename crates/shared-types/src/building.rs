//! Building records as exchanged between the store, the API and the viewer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A building footprint with its real-world height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i32,
    pub name: String,
    /// Height in meters
    pub height: f64,
    pub building_type: String,
    pub address: Option<String>,
    pub geometry: Geometry,
}

/// Building data ready to be inserted (the store assigns the id)
#[derive(Debug, Clone, PartialEq)]
pub struct NewBuilding {
    pub name: String,
    pub height: f64,
    pub building_type: String,
    pub address: Option<String>,
    /// Closed outer ring as (longitude, latitude) pairs
    pub ring: Vec<[f64; 2]>,
}

/// A building returned by a proximity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyBuilding {
    #[serde(flatten)]
    pub building: Building,
    /// Geodesic distance from the query point in meters
    pub distance: f64,
}

/// Per-type aggregate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTypeStatistics {
    pub building_type: String,
    pub count: i64,
    pub avg_height: f64,
    pub max_height: f64,
    pub min_height: f64,
}

/// Whole-table aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightSummary {
    pub total_buildings: i64,
    pub building_types: i64,
    pub avg_height: f64,
    pub max_height: f64,
    pub min_height: f64,
}

/// GeoJSON geometry object.
///
/// Coordinates are kept as raw JSON so that a single malformed or
/// non-polygon geometry never fails deserialization of a whole list; the
/// viewer validates each one through [`Geometry::outer_ring`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("unsupported geometry type: {0}")]
    NotPolygon(String),

    #[error("polygon has no outer ring")]
    MissingRing,

    #[error("position {0} is not a [lng, lat] pair of finite numbers")]
    BadPosition(usize),

    #[error("ring has {0} positions, at least 4 required")]
    TooFewPositions(usize),

    #[error("ring is not closed")]
    NotClosed,
}

impl Geometry {
    /// Build a Polygon geometry from a single ring of (lng, lat) pairs.
    /// The elevation component is written as 0, matching the stored POLYGONZ.
    pub fn polygon(ring: &[[f64; 2]]) -> Self {
        let positions: Vec<Value> = ring
            .iter()
            .map(|[lng, lat]| serde_json::json!([lng, lat, 0.0]))
            .collect();
        Self {
            kind: "Polygon".to_string(),
            coordinates: Value::Array(vec![Value::Array(positions)]),
        }
    }

    /// Extract and validate the outer ring as (lng, lat) pairs.
    ///
    /// The returned ring keeps the closing position.
    pub fn outer_ring(&self) -> Result<Vec<[f64; 2]>, GeometryError> {
        if self.kind != "Polygon" {
            return Err(GeometryError::NotPolygon(self.kind.clone()));
        }

        let ring = self
            .coordinates
            .as_array()
            .and_then(|rings| rings.first())
            .and_then(Value::as_array)
            .ok_or(GeometryError::MissingRing)?;

        let mut points = Vec::with_capacity(ring.len());
        for (i, position) in ring.iter().enumerate() {
            let pair = position
                .as_array()
                .filter(|p| p.len() >= 2)
                .and_then(|p| Some([p[0].as_f64()?, p[1].as_f64()?]))
                .filter(|[lng, lat]| lng.is_finite() && lat.is_finite())
                .ok_or(GeometryError::BadPosition(i))?;
            points.push(pair);
        }

        if points.len() < 4 {
            return Err(GeometryError::TooFewPositions(points.len()));
        }
        if points.first() != points.last() {
            return Err(GeometryError::NotClosed);
        }

        Ok(points)
    }
}
