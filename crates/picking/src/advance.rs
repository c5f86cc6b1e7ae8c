//! Greedy tightening of boundary primitives toward an observer.
//!
//! Both advancers are order-sensitive reducers: each call looks at one new
//! surface sample and either swaps it in for one vertex or leaves the
//! primitive untouched. Fed with samples in the outside-in order produced by
//! [`crate::attach::outside_in`], the earliest accepted samples anchor the
//! primitive near the region's rim and later, more central samples only pull
//! it toward the eye. Feeding the same samples in another order gives a
//! different primitive.

use glam::Vec3;
use tracing::trace;

use crate::constants::{ADVANCE_EPSILON, DEGENERATE_EPSILON};
use crate::intersection::{
    intersect_ray_with_plane, plane_is_degenerate, plane_normal, triangle_is_thin,
};
use crate::types::Ray;

/// Try to move the plane through `plane` toward `eye` using the sample `x`.
///
/// The vertex closest to `x` shifted along the eye-facing normal is replaced
/// by `x` when that vertex is farther from the eye than from the shifted
/// sample. Samples that are not in front of the plane (as seen from the eye)
/// never move it, so a plane only ever advances toward the eye.
///
/// Returns the index of the replaced vertex, or `None` when the plane is
/// unchanged.
pub fn advance_plane(eye: Vec3, plane: &mut [Vec3; 3], x: Vec3) -> Option<usize> {
    if plane_is_degenerate(plane) {
        return None;
    }

    let mut n = plane_normal(plane).normalize();
    if (eye - plane[0]).dot(n) < 0.0 {
        n = -n;
    }

    if (x - plane[0]).dot(n) <= ADVANCE_EPSILON {
        trace!("advance_plane: sample not in front of plane");
        return None;
    }

    let hit = intersect_ray_with_plane(&Ray::new(eye, n), plane).ok()?;
    let xp = x + n * hit.distance;

    let (i_min, d_min) = plane
        .iter()
        .map(|p| p.distance_squared(xp))
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    if plane[i_min].distance_squared(eye) <= d_min {
        return None;
    }

    let mut candidate = *plane;
    candidate[i_min] = x;
    if triangle_is_thin(&candidate) {
        trace!("advance_plane: replacement would leave a sliver");
        return None;
    }

    *plane = candidate;
    Some(i_min)
}

/// Try to move the segment `ab` toward `eye` using the sample `x`.
///
/// `x` is projected into the plane spanned by the eye and the segment. In
/// that plane `u` measures how far the projection lies toward the eye from
/// the segment's line and `v` how far along `a -> b` it lies. Samples behind
/// the line (`u < 0`) are ignored; otherwise the endpoint on the sample's half
/// of the segment is replaced.
///
/// Returns the index of the replaced endpoint, or `None` when unchanged.
pub fn advance_seg(eye: Vec3, ab: &mut [Vec3; 2], x: Vec3) -> Option<usize> {
    let [a, b] = *ab;
    let dir = b - a;
    let dab = dir.length();
    if dab * dab <= DEGENERATE_EPSILON {
        return None;
    }

    let to_a = a - eye;
    let to_b = b - eye;
    let n = to_b.cross(to_a);
    if n.length_squared() <= DEGENERATE_EPSILON * to_a.length_squared() * to_b.length_squared() {
        // Eye on the segment's line: no plane to work in
        return None;
    }

    let xp0 = (x - a).reject_from(n);
    let toward_eye = (eye - a).reject_from(dir).normalize();
    let u = xp0.dot(toward_eye);
    let v = xp0.dot(dir / dab);

    if u < 0.0 {
        trace!("advance_seg: sample behind segment (u={u})");
        return None;
    }

    let i = if v < dab / 2.0 { 0 } else { 1 };
    let mut candidate = *ab;
    candidate[i] = x;
    if candidate[0].distance_squared(candidate[1]) <= DEGENERATE_EPSILON {
        return None;
    }

    *ab = candidate;
    Some(i)
}
