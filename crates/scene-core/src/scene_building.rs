//! Per-building scene data derived from a building record

use serde::{Deserialize, Serialize};
use shared_types::Building;

use crate::error::SceneError;
use crate::height::HeightScale;
use crate::projection::{Projection, ScenePoint};

/// Axis-aligned footprint extent on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootprintBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl FootprintBounds {
    fn around(points: &[ScenePoint]) -> Self {
        points.iter().fold(
            FootprintBounds {
                min_x: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                min_z: f64::INFINITY,
                max_z: f64::NEG_INFINITY,
            },
            |b, p| FootprintBounds {
                min_x: b.min_x.min(p.x),
                max_x: b.max_x.max(p.x),
                min_z: b.min_z.min(p.z),
                max_z: b.max_z.max(p.z),
            },
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Larger of width and depth
    pub fn size(&self) -> f64 {
        self.width().max(self.depth())
    }

    pub fn union(&self, other: &FootprintBounds) -> FootprintBounds {
        FootprintBounds {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }
}

/// A building placed on the scene plane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneBuilding {
    pub building: Building,
    /// Centroid of the unique projected ring vertices
    pub center: ScenePoint,
    pub bounds: FootprintBounds,
    pub footprint_size: f64,
    pub height_scale: f64,
    pub scaled_height: f64,
    pub highlighted: bool,
    /// Unique ring vertices relative to `center`
    #[serde(skip)]
    pub local_ring: Vec<ScenePoint>,
}

impl SceneBuilding {
    pub fn new(
        building: Building,
        projection: &Projection,
        scale: &HeightScale,
        highlighted: bool,
    ) -> Result<Self, SceneError> {
        if !building.height.is_finite() || building.height < 0.0 {
            return Err(SceneError::InvalidHeight(building.height));
        }

        let mut projected: Vec<ScenePoint> = building
            .geometry
            .outer_ring()?
            .iter()
            .map(|[lng, lat]| projection.project(*lng, *lat))
            .collect();
        projected.dedup();
        if projected.len() > 1 && projected.first() == projected.last() {
            projected.pop();
        }
        if projected.len() < 3 {
            return Err(SceneError::Degenerate);
        }

        let n = projected.len() as f64;
        let center = ScenePoint {
            x: projected.iter().map(|p| p.x).sum::<f64>() / n,
            z: projected.iter().map(|p| p.z).sum::<f64>() / n,
        };
        let local_ring: Vec<ScenePoint> = projected
            .iter()
            .map(|p| ScenePoint {
                x: p.x - center.x,
                z: p.z - center.z,
            })
            .collect();
        if signed_area(&local_ring).abs() <= 1e-9 {
            return Err(SceneError::Degenerate);
        }

        let bounds = FootprintBounds::around(&projected);
        let footprint_size = bounds.size();
        let height_scale = scale.factor(footprint_size);

        Ok(Self {
            scaled_height: building.height * height_scale,
            building,
            center,
            bounds,
            footprint_size,
            height_scale,
            highlighted,
            local_ring,
        })
    }

    pub fn id(&self) -> i32 {
        self.building.id
    }

    /// World-space box from the ground to the scaled roof
    pub fn aabb(&self) -> ([f64; 3], [f64; 3]) {
        (
            [self.bounds.min_x, 0.0, self.bounds.min_z],
            [self.bounds.max_x, self.scaled_height, self.bounds.max_z],
        )
    }
}

/// Shoelace area on the (x, z) plane; positive when counter-clockwise
pub(crate) fn signed_area(ring: &[ScenePoint]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.x * b.z - b.x * a.z
        })
        .sum::<f64>()
        / 2.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use shared_types::{Building, Geometry};

    /// Square footprint of `side` degrees with its south-west corner at (lng, lat)
    pub fn square_building(id: i32, lng: f64, lat: f64, side: f64, height: f64) -> Building {
        Building {
            id,
            name: format!("Building {}", id),
            height,
            building_type: "office".to_string(),
            address: None,
            geometry: Geometry::polygon(&[
                [lng, lat],
                [lng + side, lat],
                [lng + side, lat + side],
                [lng, lat + side],
                [lng, lat],
            ]),
        }
    }
}
