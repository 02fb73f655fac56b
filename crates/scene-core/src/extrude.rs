//! Footprint triangulation and prism extrusion
//!
//! Produces flat-shaded triangle meshes in the scene's Y-up frame: ground cap
//! at y = 0, roof at y = scaled height, one quad per ring edge. Faces do not
//! share vertices so each carries its own normal.

use earcutr::earcut;
use serde::Serialize;

use crate::error::SceneError;
use crate::projection::ScenePoint;
use crate::scene_building::{signed_area, SceneBuilding};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    /// xyz triples
    pub positions: Vec<f32>,
    /// xyz triples, one per position
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Number of leading vertices that form the ground cap
    #[serde(skip)]
    pub ground_vertices: usize,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Centroid of the ground cap vertices
    pub fn footprint_center(&self) -> Option<ScenePoint> {
        if self.ground_vertices == 0 {
            return None;
        }
        let (sx, sz) = self
            .positions
            .chunks_exact(3)
            .take(self.ground_vertices)
            .fold((0.0f64, 0.0f64), |(sx, sz), p| {
                (sx + f64::from(p[0]), sz + f64::from(p[2]))
            });
        let n = self.ground_vertices as f64;
        Some(ScenePoint {
            x: sx / n,
            z: sz / n,
        })
    }

    /// Concatenate `other` into this mesh, rebasing its indices
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertex_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    fn push_vertex(&mut self, position: [f64; 3], normal: [f64; 3]) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend(position.iter().map(|&v| v as f32));
        self.normals.extend(normal.iter().map(|&v| v as f32));
        index
    }
}

/// Y component of (b - a) x (c - a) for points on the ground plane
fn normal_y(a: ScenePoint, b: ScenePoint, c: ScenePoint) -> f64 {
    (b.z - a.z) * (c.x - a.x) - (b.x - a.x) * (c.z - a.z)
}

pub fn extrude(building: &SceneBuilding) -> Result<Mesh, SceneError> {
    let mut ring = building.local_ring.clone();
    // Walls below assume a clockwise ring on the (x, z) plane
    if signed_area(&ring) > 0.0 {
        ring.reverse();
    }

    let data: Vec<f64> = ring.iter().flat_map(|p| [p.x, p.z]).collect();
    let triangles = earcut(&data, &[], 2)
        .map_err(|e| SceneError::Triangulation(format!("{:?}", e)))?;
    if triangles.is_empty() {
        return Err(SceneError::Degenerate);
    }

    let (cx, cz) = (building.center.x, building.center.z);
    let h = building.scaled_height;
    let n = ring.len();
    let mut mesh = Mesh::default();

    let ground: Vec<u32> = ring
        .iter()
        .map(|p| mesh.push_vertex([p.x + cx, 0.0, p.z + cz], [0.0, -1.0, 0.0]))
        .collect();
    mesh.ground_vertices = n;
    let roof: Vec<u32> = ring
        .iter()
        .map(|p| mesh.push_vertex([p.x + cx, h, p.z + cz], [0.0, 1.0, 0.0]))
        .collect();

    for tri in triangles.chunks_exact(3) {
        let (a, mut b, mut c) = (tri[0], tri[1], tri[2]);
        if normal_y(ring[a], ring[b], ring[c]) < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }
        mesh.indices.extend([roof[a], roof[b], roof[c]]);
        mesh.indices.extend([ground[a], ground[c], ground[b]]);
    }

    for i in 0..n {
        let (p, q) = (ring[i], ring[(i + 1) % n]);
        let (dx, dz) = (q.x - p.x, q.z - p.z);
        let len = (dx * dx + dz * dz).sqrt();
        if len == 0.0 {
            continue;
        }
        let normal = [-dz / len, 0.0, dx / len];
        let b0 = mesh.push_vertex([p.x + cx, 0.0, p.z + cz], normal);
        let b1 = mesh.push_vertex([q.x + cx, 0.0, q.z + cz], normal);
        let t1 = mesh.push_vertex([q.x + cx, h, q.z + cz], normal);
        let t0 = mesh.push_vertex([p.x + cx, h, p.z + cz], normal);
        mesh.indices.extend([b0, b1, t1, b0, t1, t0]);
    }

    Ok(mesh)
}
