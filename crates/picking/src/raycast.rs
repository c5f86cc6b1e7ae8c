//! Ray-mesh intersection for the picked surface.
//!
//! This module provides ray-triangle intersection using the Moller-Trumbore algorithm
//! and the [`MeshIntersector`] seam the attachment driver samples the surface through.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{DETERMINANT_EPSILON, TRIANGLE_EPSILON};
use crate::types::{MeshHit, Ray};

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Ray parameter of the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit parameter and barycentric coordinates if the ray hits the
/// triangle in front of its origin. Both faces count.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray lies in the plane of the triangle, or the triangle is degenerate
    if det.abs() < DETERMINANT_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < TRIANGLE_EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// First-hit ray/surface intersection.
pub trait MeshIntersector {
    fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit>;
}

/// Indexed triangle mesh in model space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle indices (3 per triangle)
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Mesh with unshared vertices, three per triangle.
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let positions: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let indices = (0..positions.len() as u32).collect();
        Self { positions, indices }
    }

    /// Get the number of triangles in the mesh
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the vertex positions for a triangle.
    ///
    /// Returns `None` when an index points past the vertex list.
    pub fn triangle_positions(&self, tri_index: usize) -> Option<(Vec3, Vec3, Vec3)> {
        let base = tri_index * 3;
        let corner = |k: usize| -> Option<Vec3> {
            let index = *self.indices.get(base + k)? as usize;
            self.positions.get(index).copied()
        };
        Some((corner(0)?, corner(1)?, corner(2)?))
    }

    /// Closest front hit of the ray, in the mesh's own space.
    pub fn raycast(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<(TriangleHit, u32)> {
        let mut closest_hit: Option<(TriangleHit, u32)> = None;

        // Test all triangles (brute force - consider BVH for large meshes)
        for tri_idx in 0..self.triangle_count() {
            let Some((v0, v1, v2)) = self.triangle_positions(tri_idx) else {
                continue;
            };

            if let Some(hit) = ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2) {
                let dominated = match &closest_hit {
                    Some((prev, _)) => hit.t >= prev.t,
                    None => false,
                };
                if !dominated {
                    closest_hit = Some((hit, tri_idx as u32));
                }
            }
        }

        closest_hit
    }

    fn face_normal(&self, tri_index: u32) -> Vec3 {
        self.triangle_positions(tri_index as usize)
            .map(|(v0, v1, v2)| (v1 - v0).cross(v2 - v0).normalize_or_zero())
            .unwrap_or(Vec3::ZERO)
    }
}

impl MeshIntersector for TriangleMesh {
    fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit> {
        let (hit, triangle) = self.raycast(ray.origin, ray.direction)?;
        let point = ray.at(hit.t);
        Some(MeshHit {
            point,
            distance: (point - ray.origin).length(),
            triangle,
            normal: self.face_normal(triangle),
        })
    }
}

/// A set of meshes placed in the world by one transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceModel {
    pub meshes: Vec<TriangleMesh>,
    /// Model-to-world transform
    #[serde(default = "identity")]
    pub transform: Mat4,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl Default for SurfaceModel {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            transform: Mat4::IDENTITY,
        }
    }
}

impl SurfaceModel {
    pub fn new(meshes: Vec<TriangleMesh>, transform: Mat4) -> Self {
        Self { meshes, transform }
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(TriangleMesh::triangle_count).sum()
    }
}

impl MeshIntersector for SurfaceModel {
    /// Hit on the first mesh, in stored order, that the ray touches at all.
    fn intersect_ray(&self, ray: &Ray) -> Option<MeshHit> {
        let to_model = self.transform.inverse();
        let local_origin = to_model.transform_point3(ray.origin);
        let local_dir = to_model.transform_vector3(ray.direction);
        let normal_matrix = to_model.transpose();

        self.meshes.iter().find_map(|mesh| {
            let (hit, triangle) = mesh.raycast(local_origin, local_dir)?;
            let point = self.transform.transform_point3(local_origin + local_dir * hit.t);
            let normal = normal_matrix
                .transform_vector3(mesh.face_normal(triangle))
                .normalize_or_zero();
            Some(MeshHit {
                point,
                distance: (point - ray.origin).length(),
                triangle,
                normal,
            })
        })
    }
}
