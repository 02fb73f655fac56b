//! Camera framing
//!
//! Poses are computed from projected building centers and footprint extents
//! and applied instantly by the renderer (no animation).

use serde::{Deserialize, Serialize};

use crate::scene_building::SceneBuilding;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: [f64; 3],
    pub target: [f64; 3],
}

impl CameraPose {
    /// Looking at the middle of an empty scene from the south
    pub const OVERVIEW: CameraPose = CameraPose {
        position: [0.0, 300.0, 300.0],
        target: [0.0, 0.0, 0.0],
    };

    pub fn distance(&self) -> f64 {
        self.position
            .iter()
            .zip(&self.target)
            .map(|(p, t)| (p - t) * (p - t))
            .sum::<f64>()
            .sqrt()
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::OVERVIEW
    }
}

/// Distance rule for framing a group of buildings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    pub multiplier: f64,
    pub min_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingConfig {
    pub fit_all: FitParams,
    pub fit_highlighted: FitParams,
    pub fly_to_multiplier: f64,
    pub fly_to_min_distance: f64,
    /// Camera elevation above the target for fly-to, in degrees
    pub fly_to_elevation_deg: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            fit_all: FitParams {
                multiplier: 0.3,
                min_distance: 50.0,
            },
            fit_highlighted: FitParams {
                multiplier: 0.8,
                min_distance: 100.0,
            },
            fly_to_multiplier: 2.5,
            fly_to_min_distance: 30.0,
            fly_to_elevation_deg: 45.0,
        }
    }
}

/// Frame a group of buildings: target the mean of their centers on the
/// ground, pull back by the larger of their combined extent and tallest roof.
///
/// Returns `None` for an empty group.
pub fn fit<'a, I>(buildings: I, params: &FitParams) -> Option<CameraPose>
where
    I: IntoIterator<Item = &'a SceneBuilding>,
{
    let mut iter = buildings.into_iter();
    let first = iter.next()?;
    let mut bounds = first.bounds;
    let mut max_height = first.scaled_height;
    let (mut sx, mut sz, mut n) = (first.center.x, first.center.z, 1.0);
    for b in iter {
        bounds = bounds.union(&b.bounds);
        max_height = max_height.max(b.scaled_height);
        sx += b.center.x;
        sz += b.center.z;
        n += 1.0;
    }

    let (cx, cz) = (sx / n, sz / n);
    let d = (bounds.width().max(bounds.depth()).max(max_height) * params.multiplier)
        .max(params.min_distance);
    Some(CameraPose {
        position: [cx, d, cz + d],
        target: [cx, 0.0, cz],
    })
}

/// Close-up on one building, looking at the middle of its scaled height
pub fn fly_to(building: &SceneBuilding, config: &FramingConfig) -> CameraPose {
    let d = (building.footprint_size.max(building.scaled_height) * config.fly_to_multiplier)
        .max(config.fly_to_min_distance);
    let elevation = config.fly_to_elevation_deg.to_radians();
    let target = [
        building.center.x,
        building.scaled_height / 2.0,
        building.center.z,
    ];
    CameraPose {
        position: [
            target[0],
            target[1] + d * elevation.sin(),
            target[2] + d * elevation.cos(),
        ],
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height::HeightScale;
    use crate::projection::Projection;
    use crate::scene_building::fixtures::square_building;
    use pretty_assertions::assert_eq;

    const EPS: f64 = 1e-6;

    fn place(id: i32, lng: f64, lat: f64, side: f64, height: f64) -> SceneBuilding {
        SceneBuilding::new(
            square_building(id, lng, lat, side, height),
            &Projection::default(),
            &HeightScale::default(),
            false,
        )
        .unwrap()
    }

    fn assert_close(a: [f64; 3], b: [f64; 3]) {
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < EPS, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_fit_empty_is_none() {
        let none: [SceneBuilding; 0] = [];
        assert_eq!(fit(&none, &FramingConfig::default().fit_all), None);
    }

    #[test]
    fn test_fit_all_uses_extent() {
        // Two 50-unit squares 200 units apart on x
        let a = place(1, 39.8, 21.4, 0.01, 40.0);
        let b = place(2, 39.84, 21.4, 0.01, 40.0);
        let pose = fit([&a, &b], &FramingConfig::default().fit_all).unwrap();
        // extent 250 * 0.3 = 75
        assert_close(pose.target, [125.0, 0.0, 25.0]);
        assert_close(pose.position, [125.0, 75.0, 100.0]);
    }

    #[test]
    fn test_fit_applies_floor() {
        let a = place(1, 39.8, 21.4, 0.002, 10.0);
        let pose = fit([&a], &FramingConfig::default().fit_all).unwrap();
        assert_close(pose.position, [5.0, 50.0, 55.0]);
    }

    #[test]
    fn test_fit_tall_building_dominates() {
        let a = place(1, 39.8, 21.4, 0.01, 600.0);
        let pose = fit([&a], &FramingConfig::default().fit_highlighted).unwrap();
        assert_close(pose.position, [25.0, 480.0, 505.0]);
    }

    #[test]
    fn test_fly_to_45_degrees() {
        let a = place(1, 39.8, 21.4, 0.01, 100.0);
        let pose = fly_to(&a, &FramingConfig::default());
        // max(50, 100) * 2.5
        let d = 250.0;
        let offset = d * std::f64::consts::FRAC_1_SQRT_2;
        assert_close(pose.target, [25.0, 50.0, 25.0]);
        assert_close(pose.position, [25.0, 50.0 + offset, 25.0 + offset]);
        assert!((pose.distance() - d).abs() < EPS);
    }

    #[test]
    fn test_fly_to_minimum_distance() {
        let a = place(1, 39.8, 21.4, 0.0005, 4.0);
        let pose = fly_to(&a, &FramingConfig::default());
        assert!((pose.distance() - 30.0).abs() < EPS);
    }
}
