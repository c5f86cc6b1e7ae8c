//! Orientation and distance primitives.

use glam::{Vec2, Vec3};

use crate::types::Ray;

/// Z component of the 2D cross product of `a->b` and `a->c`.
///
/// Positive when `a -> b -> c` turns left (counterclockwise), zero when the
/// three points are collinear. No tolerance is applied.
pub fn turn(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether `p` lies inside (or on the edge of) the polygon `vertices`.
///
/// Vertices must be listed counterclockwise and form a convex polygon; the
/// closing edge from the last vertex back to the first is included. Concave
/// orderings are not supported and reject some interior points.
pub fn inside_convex_polygon(vertices: &[Vec2], p: Vec2) -> bool {
    match vertices.len() {
        0 => false,
        1 => vertices[0] == p,
        n => (0..n).all(|k| turn(vertices[k], vertices[(k + 1) % n], p) >= 0.0),
    }
}

/// Perpendicular distance from `point` to the line through `ray`.
///
/// The result is scaled by the length of the ray direction; rays cast from
/// the same camera share that scale, so it is only meant for comparing
/// candidates against the same ray.
pub fn ray_point_distance(ray: &Ray, point: Vec3) -> f32 {
    ray.direction.cross(point - ray.origin).length()
}
