//! Geographic to scene coordinate projection
//!
//! A fixed affine map from a (lng, lat) bounding box onto a square of
//! `SCENE_SPAN` scene units centered on the origin. Longitude drives `x`,
//! latitude drives `z`. Nothing is clamped: coordinates outside the box land
//! outside ±SPAN/2.

use serde::{Deserialize, Serialize};

/// Width and depth of the scene square in scene units
pub const SCENE_SPAN: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Extent of the Makkah OSM extract the building table is loaded from
    pub const MAKKAH: GeoBounds = GeoBounds {
        min_lng: 39.7,
        max_lng: 39.9,
        min_lat: 21.3,
        max_lat: 21.5,
    };

    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        (self.min_lng..=self.max_lng).contains(&lng) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::MAKKAH
    }
}

/// A point on the scene's ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub bounds: GeoBounds,
    pub span: f64,
}

impl Projection {
    pub fn new(bounds: GeoBounds) -> Self {
        Self {
            bounds,
            span: SCENE_SPAN,
        }
    }

    pub fn project(&self, lng: f64, lat: f64) -> ScenePoint {
        let b = &self.bounds;
        let x = (lng - b.min_lng) / (b.max_lng - b.min_lng) * self.span - self.span / 2.0;
        let z = (lat - b.min_lat) / (b.max_lat - b.min_lat) * self.span - self.span / 2.0;
        ScenePoint { x, z }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(GeoBounds::default())
    }
}

/// Project with the default bounds and span
pub fn project(lng: f64, lat: f64) -> ScenePoint {
    Projection::default().project(lng, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn close(a: ScenePoint, b: ScenePoint, eps: f64) -> bool {
        (a.x - b.x).abs() < eps && (a.z - b.z).abs() < eps
    }

    #[test]
    fn test_corners_map_to_span_edges() {
        let b = GeoBounds::MAKKAH;
        assert!(close(
            project(b.min_lng, b.min_lat),
            ScenePoint { x: -500.0, z: -500.0 },
            EPS
        ));
        assert!(close(
            project(b.max_lng, b.max_lat),
            ScenePoint { x: 500.0, z: 500.0 },
            EPS
        ));
    }

    #[test]
    fn test_center_maps_to_origin() {
        assert!(close(project(39.8, 21.4), ScenePoint { x: 0.0, z: 0.0 }, 1e-6));
    }

    #[test]
    fn test_outside_box_is_not_clamped() {
        let p = project(40.0, 21.2);
        assert!((p.x - 1000.0).abs() < 1e-6);
        assert!((p.z + 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_contains() {
        assert!(GeoBounds::MAKKAH.contains(39.8262, 21.4225));
        assert!(!GeoBounds::MAKKAH.contains(-73.98, 40.74));
    }

    fn bounds_strategy() -> impl Strategy<Value = GeoBounds> {
        (-170.0f64..170.0, 0.01f64..5.0, -80.0f64..80.0, 0.01f64..5.0).prop_map(
            |(min_lng, w, min_lat, h)| GeoBounds {
                min_lng,
                max_lng: min_lng + w,
                min_lat,
                max_lat: min_lat + h,
            },
        )
    }

    proptest! {
        #[test]
        fn inside_box_stays_within_half_span(u in 0.0f64..=1.0, v in 0.0f64..=1.0) {
            let b = GeoBounds::MAKKAH;
            let lng = b.min_lng + u * (b.max_lng - b.min_lng);
            let lat = b.min_lat + v * (b.max_lat - b.min_lat);
            let p = project(lng, lat);
            prop_assert!(p.x >= -500.0 - EPS && p.x <= 500.0 + EPS);
            prop_assert!(p.z >= -500.0 - EPS && p.z <= 500.0 + EPS);
        }

        /// Moving the box and the point by the same scale/offset leaves the output unchanged
        #[test]
        fn invariant_under_box_transform(
            bounds in bounds_strategy(),
            u in -0.5f64..1.5,
            v in -0.5f64..1.5,
            k in 0.1f64..10.0,
            t in -5.0f64..5.0,
        ) {
            let lng = bounds.min_lng + u * (bounds.max_lng - bounds.min_lng);
            let lat = bounds.min_lat + v * (bounds.max_lat - bounds.min_lat);
            let moved = GeoBounds {
                min_lng: bounds.min_lng * k + t,
                max_lng: bounds.max_lng * k + t,
                min_lat: bounds.min_lat * k + t,
                max_lat: bounds.max_lat * k + t,
            };
            let a = Projection::new(bounds).project(lng, lat);
            let b = Projection::new(moved).project(lng * k + t, lat * k + t);
            prop_assert!(close(a, b, 1e-6));
        }

        /// The map is affine: midpoints map to midpoints
        #[test]
        fn preserves_midpoints(
            bounds in bounds_strategy(),
            u1 in 0.0f64..1.0, v1 in 0.0f64..1.0,
            u2 in 0.0f64..1.0, v2 in 0.0f64..1.0,
        ) {
            let projection = Projection::new(bounds);
            let at = |u: f64, v: f64| {
                (
                    bounds.min_lng + u * (bounds.max_lng - bounds.min_lng),
                    bounds.min_lat + v * (bounds.max_lat - bounds.min_lat),
                )
            };
            let (lng1, lat1) = at(u1, v1);
            let (lng2, lat2) = at(u2, v2);
            let p1 = projection.project(lng1, lat1);
            let p2 = projection.project(lng2, lat2);
            let mid = projection.project((lng1 + lng2) / 2.0, (lat1 + lat2) / 2.0);
            let expected = ScenePoint { x: (p1.x + p2.x) / 2.0, z: (p1.z + p2.z) / 2.0 };
            prop_assert!(close(mid, expected, 1e-6));
        }
    }
}
