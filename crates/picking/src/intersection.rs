//! Ray intersection against boundary primitives.
//!
//! A three-point boundary is treated as the infinite plane through its
//! vertices, a two-point boundary as the infinite line through its endpoints.
//! No range restriction is applied to the ray parameter: hits behind the ray
//! origin are still reported, since callers only intersect boundaries fit
//! along the same line of sight.

use glam::Vec3;
use thiserror::Error;

use crate::constants::{DEGENERATE_EPSILON, PARALLEL_EPSILON, THIN_TRIANGLE_EPSILON};
use crate::types::{Boundary, BoundaryHit, Ray};

/// Why a ray/boundary intersection produced no point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntersectionError {
    #[error("Ray is parallel to the boundary")]
    Parallel,
    #[error("Boundary primitive is degenerate")]
    Degenerate,
    #[error("Boundary has fewer than two points")]
    NoHit,
}

/// Intersect a ray with a point, segment or plane boundary.
pub fn intersect_ray_with_boundary(
    ray: &Ray,
    boundary: &Boundary,
) -> Result<BoundaryHit, IntersectionError> {
    match *boundary.points() {
        [p0, p1, p2] => intersect_ray_with_plane(ray, &[p0, p1, p2]),
        [a, b] => intersect_ray_with_line(ray, a, b),
        _ => Err(IntersectionError::NoHit),
    }
}

/// Unnormalized normal of the plane through three points.
///
/// Oriented as `(p2 - p0) x (p1 - p0)`; callers that care about the side
/// flip it themselves.
pub fn plane_normal(plane: &[Vec3; 3]) -> Vec3 {
    (plane[2] - plane[0]).cross(plane[1] - plane[0])
}

/// Whether three points fail to span a plane.
pub fn plane_is_degenerate(plane: &[Vec3; 3]) -> bool {
    let e1 = plane[2] - plane[0];
    let e2 = plane[1] - plane[0];
    let scale = e1.length_squared() * e2.length_squared();
    e1.cross(e2).length_squared() <= DEGENERATE_EPSILON * scale
}

/// Whether any corner of the triangle is too sharp to fix its plane reliably.
pub fn triangle_is_thin(tri: &[Vec3; 3]) -> bool {
    (0..3).any(|k| {
        let e1 = tri[(k + 1) % 3] - tri[k];
        let e2 = tri[(k + 2) % 3] - tri[k];
        let scale = e1.length_squared() * e2.length_squared();
        e1.cross(e2).length_squared() <= THIN_TRIANGLE_EPSILON * scale
    })
}

/// Intersect a ray with the plane through three points.
pub fn intersect_ray_with_plane(
    ray: &Ray,
    plane: &[Vec3; 3],
) -> Result<BoundaryHit, IntersectionError> {
    if plane_is_degenerate(plane) {
        return Err(IntersectionError::Degenerate);
    }
    let n = plane_normal(plane);

    let den = n.dot(ray.direction);
    if den.abs() <= PARALLEL_EPSILON * n.length() * ray.direction.length() {
        return Err(IntersectionError::Parallel);
    }

    let t = n.dot(plane[0] - ray.origin) / den;
    Ok(BoundaryHit {
        distance: t,
        point: ray.at(t),
    })
}

/// Closest approach of a ray to the line through `a` and `b`.
///
/// Both the ray direction and the origin offset are rejected from the
/// segment direction; in that perpendicular space the line collapses to a
/// point and the closest ray parameter is a one-dimensional least squares
/// solve. The returned point lies on the ray.
pub fn intersect_ray_with_line(
    ray: &Ray,
    a: Vec3,
    b: Vec3,
) -> Result<BoundaryHit, IntersectionError> {
    let ab = b - a;
    if ab.length_squared() <= DEGENERATE_EPSILON {
        return Err(IntersectionError::Degenerate);
    }

    let d_perp = ray.direction.reject_from(ab);
    let dd = d_perp.length_squared();
    if dd <= PARALLEL_EPSILON * ray.direction.length_squared() {
        return Err(IntersectionError::Parallel);
    }

    let w_perp = (ray.origin - a).reject_from(ab);
    let t = -w_perp.dot(d_perp) / dd;
    Ok(BoundaryHit {
        distance: t,
        point: ray.at(t),
    })
}
