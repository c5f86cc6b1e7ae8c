//! Attachment of a camera's picks onto a fitted tangent primitive.
//!
//! The picks of one camera span a screen-space region. That region is
//! sampled from the outside in, every sample that hits the surface feeds the
//! boundary advancer, and finally every pick is re-cast through its screen
//! position onto the finished primitive:
//!
//! - two picks fit a segment, sampled along the screen segment between them
//! - three or more picks fit a plane, sampled on a grid over their bounding
//!   box and restricted to the polygon the picks outline
//!
//! The polygon test uses [`turn`](crate::orientation::turn) on raw screen
//! coordinates, so picks are expected in the order where every interior point
//! is to the left of each edge in that frame. With Y growing downward this is
//! a clockwise loop on the display.

mod traversal;

pub use traversal::{grid_coordinate, grid_outside_in, outside_in};

use glam::{Vec2, Vec3};
use thiserror::Error;
use tracing::{debug, info, warn};

use tangent_config::AttachConfig;

use crate::advance::{advance_plane, advance_seg};
use crate::camera::ScreenRays;
use crate::intersection::intersect_ray_with_boundary;
use crate::orientation::inside_convex_polygon;
use crate::raycast::MeshIntersector;
use crate::store::{PickStore, StoreError};
use crate::types::{Boundary, CameraId, Pick, PickId, PickSet};

/// Error type for attachment configuration mistakes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("Attachment grid must be at least 1x1, got {width}x{height}")]
    InvalidGrid { width: u32, height: u32 },
}

/// What one attachment run did.
#[derive(Debug)]
pub struct AttachReport {
    pub camera: CameraId,
    /// Picks owned by the camera when the run started
    pub picks_considered: usize,
    /// Rays cast at the surface
    pub samples: usize,
    /// Samples outside the picks' polygon
    pub rejected: usize,
    /// Samples that hit the surface
    pub hits: usize,
    /// The fitted primitive
    pub boundary: Boundary,
    /// `(old, new)` identifiers of re-projected picks
    pub updated: Vec<(PickId, PickId)>,
    /// Picks the boundary gave no point for
    pub unchanged: usize,
    /// Picks whose write-back failed; they keep their previous value
    pub failures: Vec<(PickId, StoreError)>,
}

impl AttachReport {
    fn new(camera: CameraId, picks_considered: usize) -> Self {
        Self {
            camera,
            picks_considered,
            samples: 0,
            rejected: 0,
            hits: 0,
            boundary: Boundary::new(),
            updated: Vec::new(),
            unchanged: 0,
            failures: Vec::new(),
        }
    }
}

/// Fit a tangent primitive to the surface under `camera`'s picks and move
/// those picks onto it.
///
/// Fewer than two picks is a no-op. Each pick is persisted through
/// [`PickStore::replace_pick`] before its in-memory copy changes; a failed
/// write is recorded in the report and the remaining picks still proceed.
pub fn attach_polygon<R, M, S>(
    picks: &mut PickSet,
    camera: CameraId,
    view: &R,
    mesh: &M,
    store: &mut S,
    config: &AttachConfig,
) -> Result<AttachReport, AttachError>
where
    R: ScreenRays,
    M: MeshIntersector,
    S: PickStore,
{
    if config.grid_width == 0 || config.grid_height == 0 {
        return Err(AttachError::InvalidGrid {
            width: config.grid_width,
            height: config.grid_height,
        });
    }

    let group: Vec<Pick> = picks.for_camera(camera).copied().collect();
    let mut report = AttachReport::new(camera, group.len());
    if group.len() < 2 {
        debug!("Camera {camera} has {} picks, nothing to attach", group.len());
        return Ok(report);
    }

    let mut sampler = Sampler {
        view,
        mesh,
        eye: view.eye(),
        report: &mut report,
    };
    let boundary = if group.len() == 2 {
        sampler.fit_segment(group[0].screen, group[1].screen, config.grid_width as usize)
    } else {
        let outline: Vec<Vec2> = group.iter().map(|p| p.screen).collect();
        sampler.fit_plane(
            &outline,
            config.grid_width as usize,
            config.grid_height as usize,
        )
    };
    report.boundary = boundary;

    for pick in &group {
        reproject(pick, view, &boundary, picks, store, &mut report);
    }

    info!(
        "Attached camera {camera}: {} picks, {} samples ({} rejected, {} hits), boundary {:?}, {} updated, {} failed",
        report.picks_considered,
        report.samples,
        report.rejected,
        report.hits,
        boundary.kind(),
        report.updated.len(),
        report.failures.len()
    );
    Ok(report)
}

struct Sampler<'a, R, M> {
    view: &'a R,
    mesh: &'a M,
    eye: Vec3,
    report: &'a mut AttachReport,
}

impl<R: ScreenRays, M: MeshIntersector> Sampler<'_, R, M> {
    /// Surface point under a screen position
    fn cast(&mut self, screen: Vec2) -> Option<Vec3> {
        self.report.samples += 1;
        let hit = self.mesh.intersect_ray(&self.view.screen_ray(screen));
        if hit.is_some() {
            self.report.hits += 1;
        }
        hit.map(|h| h.point)
    }

    fn fit_segment(&mut self, from: Vec2, to: Vec2, n: usize) -> Boundary {
        let mut boundary = Boundary::new();
        for k in outside_in(n) {
            let screen = from.lerp(to, grid_coordinate(0.0, 1.0, k, n));
            let Some(x) = self.cast(screen) else {
                continue;
            };
            if boundary.len() < 2 {
                seed(&mut boundary, x);
            } else if let Some(segment) = boundary.as_segment_mut() {
                advance_seg(self.eye, segment, x);
            }
        }
        boundary
    }

    fn fit_plane(&mut self, outline: &[Vec2], nx: usize, ny: usize) -> Boundary {
        let lo = outline.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
        let hi = outline
            .iter()
            .copied()
            .fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);

        let mut boundary = Boundary::new();
        for (i, j) in grid_outside_in(nx, ny) {
            let screen = Vec2::new(
                grid_coordinate(lo.x, hi.x, i, nx),
                grid_coordinate(lo.y, hi.y, j, ny),
            );
            if !inside_convex_polygon(outline, screen) {
                self.report.rejected += 1;
                continue;
            }
            let Some(x) = self.cast(screen) else {
                continue;
            };
            if boundary.len() < 3 {
                seed(&mut boundary, x);
            } else if let Some(plane) = boundary.as_plane_mut() {
                advance_plane(self.eye, plane, x);
            }
        }
        boundary
    }
}

fn seed(boundary: &mut Boundary, x: Vec3) {
    if !boundary.push_seed(x) {
        debug!("Skipping degenerate seed {x}");
    }
}

fn reproject<R: ScreenRays, S: PickStore>(
    pick: &Pick,
    view: &R,
    boundary: &Boundary,
    picks: &mut PickSet,
    store: &mut S,
    report: &mut AttachReport,
) {
    let ray = view.screen_ray(pick.screen);
    let hit = match intersect_ray_with_boundary(&ray, boundary) {
        Ok(hit) => hit,
        Err(e) => {
            debug!("Pick {} left in place: {e}", pick.id);
            report.unchanged += 1;
            return;
        }
    };

    match store.replace_pick(pick.id, pick.screen, hit.point, pick.camera) {
        Ok(id) => {
            picks.replace_id(
                pick.id,
                Pick {
                    id,
                    world: hit.point,
                    ..*pick
                },
            );
            report.updated.push((pick.id, id));
        }
        Err(e) => {
            warn!("Failed to persist re-projected pick {}: {e}", pick.id);
            report.failures.push((pick.id, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraPose, CameraView};
    use crate::orientation::turn;
    use crate::raycast::TriangleMesh;
    use crate::store::MemoryStore;
    use crate::types::ModelId;
    use tangent_config::DisplayConfig;

    const TOL: f32 = 1e-3;

    fn flat_mesh(z: f32) -> TriangleMesh {
        let a = Vec3::new(-20.0, -20.0, z);
        let b = Vec3::new(20.0, -20.0, z);
        let c = Vec3::new(20.0, 20.0, z);
        let d = Vec3::new(-20.0, 20.0, z);
        TriangleMesh::from_triangles(&[[a, b, c], [a, c, d]])
    }

    fn oblique_view() -> CameraView {
        CameraView::new(
            CameraPose {
                position: Vec3::new(3.0, -4.0, 10.0),
                target: Vec3::ZERO,
                ..CameraPose::default()
            },
            DisplayConfig::new(1200, 800),
        )
    }

    /// Signed area of a screen loop in the `turn` sense
    fn loop_area(screens: &[Vec2]) -> f32 {
        (1..screens.len().saturating_sub(1))
            .map(|k| turn(screens[0], screens[k], screens[k + 1]))
            .sum()
    }

    /// Store picks for the given surface points, ordered for the polygon
    /// test, with world positions pushed off the surface along their rays.
    fn setup(
        view: &CameraView,
        surface_points: &[Vec3],
    ) -> (MemoryStore, PickSet, CameraId) {
        let mut store = MemoryStore::new();
        let camera = store.insert_camera(view.pose, ModelId(1)).unwrap();

        let mut screens: Vec<Vec2> = surface_points
            .iter()
            .map(|&p| view.world_to_screen(p).unwrap())
            .collect();
        if loop_area(&screens) < 0.0 {
            screens.reverse();
        }

        for (k, &screen) in screens.iter().enumerate() {
            let ray = view.screen_ray(screen);
            let wrong_depth = ray.at(5.0 + k as f32);
            store.insert_pick(screen, wrong_depth, camera).unwrap();
        }
        let picks = PickSet::from(store.picks_for_camera(camera).unwrap());
        (store, picks, camera)
    }

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(-2.0, -2.0, 0.0),
            Vec3::new(2.0, -2.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(-2.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn test_quadrilateral_attaches_coplanar() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (mut store, mut picks, camera) = setup(&view, &square());

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::with_grid(10, 10),
        )
        .unwrap();

        assert_eq!(report.picks_considered, 4);
        assert_eq!(report.boundary.len(), 3);
        assert_eq!(report.updated.len(), 4);
        assert!(report.failures.is_empty());
        assert!(report.hits > 0);

        for pick in picks.iter() {
            assert!(pick.world.z.abs() < TOL, "pick {} at {}", pick.id, pick.world);
            assert!(square().iter().any(|p| p.distance(pick.world) < 1e-2));
        }

        // Memory and store agree on the fresh ids
        let stored = store.picks_for_camera(camera).unwrap();
        assert_eq!(stored, picks.as_slice());
        for (old, new) in &report.updated {
            assert_ne!(old, new);
            assert!(picks.get(*new).is_some());
        }
    }

    #[test]
    fn test_two_picks_attach_to_segment() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let targets = [Vec3::new(-1.5, 0.5, 0.0), Vec3::new(2.0, -1.0, 0.0)];
        let (mut store, mut picks, camera) = setup(&view, &targets);

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::with_grid(10, 10),
        )
        .unwrap();

        assert_eq!(report.boundary.len(), 2);
        assert_eq!(report.samples, 10);
        assert_eq!(report.updated.len(), 2);
        for pick in picks.iter() {
            assert!(targets.iter().any(|p| p.distance(pick.world) < 1e-2));
        }
    }

    #[test]
    fn test_misses_leave_picks_unmodified() {
        let view = oblique_view();
        // Surface far off to the side of every sample
        let mesh = TriangleMesh::from_triangles(&[[
            Vec3::new(100.0, 100.0, 0.0),
            Vec3::new(101.0, 100.0, 0.0),
            Vec3::new(100.0, 101.0, 0.0),
        ]]);
        let (mut store, mut picks, camera) = setup(&view, &square());
        let before = picks.clone();

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::default(),
        )
        .unwrap();

        assert_eq!(report.hits, 0);
        assert!(report.boundary.is_empty());
        assert_eq!(report.unchanged, 4);
        assert!(report.updated.is_empty());
        assert_eq!(picks, before);
        assert_eq!(store.picks_for_camera(camera).unwrap(), before.as_slice());
    }

    #[test]
    fn test_reversed_outline_rejects_every_sample() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (mut store, picks, camera) = setup(&view, &square());
        let mut reversed: PickSet = picks.as_slice().iter().rev().copied().collect();

        let report = attach_polygon(
            &mut reversed,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::default(),
        )
        .unwrap();

        assert_eq!(report.samples, 0);
        assert_eq!(report.rejected, 100);
        assert!(report.updated.is_empty());
    }

    #[test]
    fn test_single_pick_is_noop() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (mut store, mut picks, camera) = setup(&view, &square()[..1]);

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::default(),
        )
        .unwrap();
        assert_eq!(report.samples, 0);
        assert!(report.updated.is_empty());
    }

    #[test]
    fn test_other_cameras_are_untouched() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (mut store, mut picks, camera) = setup(&view, &square());
        let other = store.insert_camera(view.pose, ModelId(1)).unwrap();
        let foreign = store.insert_pick(Vec2::new(600.0, 400.0), Vec3::ONE, other).unwrap();
        picks.push(store.picks_for_camera(other).unwrap()[0]);

        attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::default(),
        )
        .unwrap();

        assert_eq!(picks.get(foreign).map(|p| p.world), Some(Vec3::ONE));
    }

    #[test]
    fn test_zero_grid_is_an_error() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (mut store, mut picks, camera) = setup(&view, &square());

        let err = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::with_grid(0, 10),
        )
        .unwrap_err();
        assert_eq!(err, AttachError::InvalidGrid { width: 0, height: 10 });
    }

    /// Store that refuses to rewrite one pick
    struct RefusingStore {
        inner: MemoryStore,
        refuse: PickId,
    }

    impl PickStore for RefusingStore {
        fn insert_pick(
            &mut self,
            screen: Vec2,
            world: Vec3,
            camera: CameraId,
        ) -> Result<PickId, StoreError> {
            self.inner.insert_pick(screen, world, camera)
        }

        fn delete_pick(&mut self, id: PickId) -> Result<(), StoreError> {
            self.inner.delete_pick(id)
        }

        fn replace_pick(
            &mut self,
            old: PickId,
            screen: Vec2,
            world: Vec3,
            camera: CameraId,
        ) -> Result<PickId, StoreError> {
            if old == self.refuse {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.replace_pick(old, screen, world, camera)
        }

        fn picks_for_camera(&self, camera: CameraId) -> Result<Vec<Pick>, StoreError> {
            self.inner.picks_for_camera(camera)
        }

        fn picks_for_model(&self, model: ModelId) -> Result<Vec<Pick>, StoreError> {
            self.inner.picks_for_model(model)
        }

        fn insert_camera(
            &mut self,
            pose: CameraPose,
            model: ModelId,
        ) -> Result<CameraId, StoreError> {
            self.inner.insert_camera(pose, model)
        }

        fn camera(&self, id: CameraId) -> Result<CameraPose, StoreError> {
            self.inner.camera(id)
        }

        fn cameras_for_model(&self, model: ModelId) -> Result<Vec<CameraId>, StoreError> {
            self.inner.cameras_for_model(model)
        }

        fn remove_camera(&mut self, id: CameraId) -> Result<(), StoreError> {
            self.inner.remove_camera(id)
        }
    }

    #[test]
    fn test_failed_write_keeps_memory_in_sync() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (inner, mut picks, camera) = setup(&view, &square());
        let refused = picks.as_slice()[1];
        let mut store = RefusingStore {
            inner,
            refuse: refused.id,
        };

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::default(),
        )
        .unwrap();

        assert_eq!(report.updated.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, refused.id);
        assert_eq!(picks.get(refused.id), Some(&refused));

        // Same picks in the same polygon order on both sides
        let stored = store.picks_for_camera(camera).unwrap();
        assert_eq!(stored, picks.as_slice());
        assert_eq!(stored[1].id, refused.id);

        // The stored outline still attaches once the store accepts writes
        let mut reloaded = PickSet::from(stored);
        let mut inner = store.inner;
        let again = attach_polygon(
            &mut reloaded,
            camera,
            &view,
            &mesh,
            &mut inner,
            &AttachConfig::default(),
        )
        .unwrap();
        assert!(again.samples > 0);
        assert_eq!(again.updated.len(), 4);
        for pick in reloaded.iter() {
            assert!(pick.world.z.abs() < TOL, "pick {} at {}", pick.id, pick.world);
        }
    }

    #[test]
    fn test_single_column_grid_plane() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let (mut store, mut picks, camera) = setup(&view, &square());

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::with_grid(1, 10),
        )
        .unwrap();

        assert_eq!(report.samples + report.rejected, 10);
        for pick in picks.iter() {
            assert!(pick.world.is_finite(), "pick {} at {}", pick.id, pick.world);
        }
        assert!(report.boundary.points().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_single_sample_segment() {
        let view = oblique_view();
        let mesh = flat_mesh(0.0);
        let targets = [Vec3::new(-1.5, 0.5, 0.0), Vec3::new(2.0, -1.0, 0.0)];
        let (mut store, mut picks, camera) = setup(&view, &targets);

        let report = attach_polygon(
            &mut picks,
            camera,
            &view,
            &mesh,
            &mut store,
            &AttachConfig::with_grid(1, 1),
        )
        .unwrap();

        // One midpoint sample seeds a point, which re-projects nothing
        assert_eq!(report.samples, 1);
        assert_eq!(report.hits, 1);
        assert_eq!(report.boundary.len(), 1);
        assert!(report.boundary.points()[0].is_finite());
        assert!(report.boundary.points()[0].z.abs() < TOL);
        assert_eq!(report.unchanged, 2);
        for pick in picks.iter() {
            assert!(pick.world.is_finite());
        }
    }
}
