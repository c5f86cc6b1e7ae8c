//! Outside-in sampling order over a screen-space grid.
//!
//! Samples are visited from the extremes toward the middle: ring `k` of an
//! `n`-sample axis holds indices `n-1-k` and `k`, in that order, collapsing to
//! a single index at the center of an odd axis. The boundary advancers depend
//! on this order.

use std::iter;

/// Number of rings on an axis of `n` samples
fn ring_count(n: usize) -> usize {
    n.div_ceil(2)
}

/// Indices of ring `k`, far side first. `k` must be below `ring_count(n)`.
fn ring(n: usize, k: usize) -> impl Iterator<Item = usize> + Clone {
    let far = n - 1 - k;
    iter::once(far).chain((far != k).then_some(k))
}

/// Indices `0..n` from the extremes inward.
///
/// For `n = 10` this yields `9, 0, 8, 1, 7, 2, 6, 3, 5, 4`.
pub fn outside_in(n: usize) -> impl Iterator<Item = usize> {
    (0..ring_count(n)).flat_map(move |k| ring(n, k))
}

/// Grid cells `(i, j)` from the outside in on both axes.
///
/// Rings of the x axis are the outer loop and rings of the y axis the inner
/// one; within a pair of rings every combination is visited, `j` varying
/// slowest.
pub fn grid_outside_in(nx: usize, ny: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..ring_count(nx)).flat_map(move |xk| {
        (0..ring_count(ny)).flat_map(move |yk| {
            ring(ny, yk).flat_map(move |j| ring(nx, xk).map(move |i| (i, j)))
        })
    })
}

/// Position of sample `k` of `n` evenly spread over `lo..=hi`.
///
/// A single sample sits at the midpoint.
pub fn grid_coordinate(lo: f32, hi: f32, k: usize, n: usize) -> f32 {
    if n <= 1 {
        return (lo + hi) / 2.0;
    }
    lo + (hi - lo) * k as f32 / (n - 1) as f32
}
