//! Screen-space picking
//!
//! Unprojects a click through the camera and intersects the resulting ray
//! with each building's ground-to-roof bounding box.

use nalgebra::{Isometry3, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraPose;
use crate::scene_building::SceneBuilding;

/// Perspective parameters of the renderer's camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub fov_y_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Lens {
    pub fn with_aspect(aspect: f64) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_y_deg: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    /// Unit length
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let direction = direction.try_normalize(f64::EPSILON)?;
        Some(Self { origin, direction })
    }

    /// Ray through normalized device coordinates (`-1..1`, y up)
    pub fn from_screen(ndc_x: f64, ndc_y: f64, pose: &CameraPose, lens: &Lens) -> Option<Self> {
        if !(lens.aspect.is_finite() && lens.aspect > 0.0) {
            return None;
        }
        let eye = Point3::from(pose.position);
        let target = Point3::from(pose.target);
        let view = Isometry3::look_at_rh(&eye, &target, &Vector3::y());
        let projection = Perspective3::new(lens.aspect, lens.fov_y_deg.to_radians(), lens.near, lens.far);

        let near = view.inverse_transform_point(
            &projection.unproject_point(&Point3::new(ndc_x, ndc_y, -1.0)),
        );
        let far = view.inverse_transform_point(
            &projection.unproject_point(&Point3::new(ndc_x, ndc_y, 1.0)),
        );
        let direction = far - near;
        if !direction.iter().all(|v| v.is_finite()) {
            return None;
        }
        Ray::new(near, direction)
    }

    /// Distance along the ray to an axis-aligned box, if it is hit in front of the origin
    pub fn intersect_box(&self, min: [f64; 3], max: [f64; 3]) -> Option<f64> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            if d.abs() < f64::EPSILON {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }
            let (mut t0, mut t1) = ((min[axis] - o) / d, (max[axis] - o) / d);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        if t_far < 0.0 {
            None
        } else {
            Some(t_near.max(0.0))
        }
    }
}

/// Id of the nearest building hit by `ray`
pub fn pick<'a, I>(ray: &Ray, buildings: I) -> Option<i32>
where
    I: IntoIterator<Item = &'a SceneBuilding>,
{
    buildings
        .into_iter()
        .filter_map(|b| {
            let (min, max) = b.aabb();
            ray.intersect_box(min, max).map(|t| (t, b.id()))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}
