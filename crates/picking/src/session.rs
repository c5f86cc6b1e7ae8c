//! Editing session: the state a picking front end keeps between frames.
//!
//! A session owns the store, the surface, the in-memory picks of one model,
//! and the active camera. Moving the camera marks it dirty; the pose is only
//! persisted once a pick is made from it.

use glam::Vec2;
use thiserror::Error;
use tracing::{debug, info};

use tangent_config::{AttachConfig, AttachmentMode, DisplayConfig};

use crate::attach::{AttachError, AttachReport, attach_polygon};
use crate::camera::{CameraPose, CameraView, ScreenRays};
use crate::orientation::ray_point_distance;
use crate::raycast::MeshIntersector;
use crate::store::{Direction, PickStore, StoreError};
use crate::types::{CameraId, ModelId, Pick, PickSet};

/// Error type for session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Attach(#[from] AttachError),
}

/// Which picks a delete request may remove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionMode {
    /// Only picks made from the active camera
    #[default]
    ActiveCamera,
    /// Any pick of the model
    AllCameras,
}

impl DeletionMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::ActiveCamera => Self::AllCameras,
            Self::AllCameras => Self::ActiveCamera,
        }
    }
}

/// Result of a pick request
#[derive(Debug)]
pub struct PickOutcome {
    /// The stored pick, `None` when the ray missed the surface
    pub pick: Option<Pick>,
    /// Attachment run triggered in envelope mode
    pub attachment: Option<AttachReport>,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Pick),
    /// The active camera owned no picks and was removed
    CameraRemoved { removed: CameraId, active: CameraId },
    Nothing,
}

pub struct PickSession<S, M> {
    store: S,
    surface: M,
    model: ModelId,
    display: DisplayConfig,
    config: AttachConfig,
    attachment: AttachmentMode,
    deletion: DeletionMode,
    pose: CameraPose,
    camera: Option<CameraId>,
    dirty: bool,
    picks: PickSet,
}

impl<S: PickStore, M: MeshIntersector> PickSession<S, M> {
    /// Load `model`'s picks and its first camera.
    ///
    /// A model without cameras starts from the default pose, marked dirty.
    pub fn open(
        store: S,
        surface: M,
        model: ModelId,
        display: DisplayConfig,
        config: AttachConfig,
    ) -> Result<Self, SessionError> {
        let picks = PickSet::from(store.picks_for_model(model)?);
        let camera = store.first_camera(model)?;
        let pose = match camera {
            Some(id) => store.camera(id)?,
            None => CameraPose::default(),
        };
        info!(
            "Opened model {model}: {} picks, camera {}",
            picks.len(),
            camera.map_or_else(|| "none".to_string(), |id| id.to_string())
        );

        Ok(Self {
            store,
            surface,
            model,
            display,
            config,
            attachment: config.mode,
            deletion: DeletionMode::default(),
            pose,
            camera,
            dirty: camera.is_none(),
            picks,
        })
    }

    pub fn picks(&self) -> &PickSet {
        &self.picks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Last persisted camera the session is on
    pub fn active_camera(&self) -> Option<CameraId> {
        self.camera
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Whether the pose has moved since it was last stored or loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn deletion_mode(&self) -> DeletionMode {
        self.deletion
    }

    pub fn attachment_mode(&self) -> AttachmentMode {
        self.attachment
    }

    pub fn view(&self) -> CameraView {
        CameraView::new(self.pose, self.display)
    }

    /// Picks made from the active camera while it is unmoved
    pub fn is_highlighted(&self, pick: &Pick) -> bool {
        !self.dirty && Some(pick.camera) == self.camera
    }

    pub fn move_camera(&mut self, pose: CameraPose) {
        self.pose = pose;
        self.dirty = true;
    }

    /// Switch to a stored camera of this model.
    pub fn select_camera(&mut self, id: CameraId) -> Result<(), SessionError> {
        if !self.store.cameras_for_model(self.model)?.contains(&id) {
            return Err(StoreError::CameraNotFound(id).into());
        }
        self.pose = self.store.camera(id)?;
        self.camera = Some(id);
        self.dirty = false;
        debug!("Active camera {id}");
        Ok(())
    }

    pub fn next_camera(&mut self) -> Result<CameraId, SessionError> {
        self.step_camera(Direction::Next)
    }

    pub fn previous_camera(&mut self) -> Result<CameraId, SessionError> {
        self.step_camera(Direction::Previous)
    }

    fn step_camera(&mut self, direction: Direction) -> Result<CameraId, SessionError> {
        let id = match self.camera {
            Some(current) => self.store.neighbor_camera(self.model, current, direction)?,
            None => self
                .store
                .first_camera(self.model)?
                .ok_or(StoreError::NoCameras(self.model))?,
        };
        self.select_camera(id)?;
        Ok(id)
    }

    /// Persist the pose if it moved, returning the camera picks attach to.
    fn persist_camera(&mut self) -> Result<CameraId, SessionError> {
        match self.camera {
            Some(id) if !self.dirty => Ok(id),
            _ => {
                let id = self.store.insert_camera(self.pose, self.model)?;
                debug!("Stored moved camera as {id}");
                self.camera = Some(id);
                self.dirty = false;
                Ok(id)
            }
        }
    }

    /// Select the surface point under `screen`.
    ///
    /// In envelope mode the active camera's picks are re-attached afterwards,
    /// whether or not the ray hit.
    pub fn pick(&mut self, screen: Vec2) -> Result<PickOutcome, SessionError> {
        let ray = self.view().screen_ray(screen);
        let pick = match self.surface.intersect_ray(&ray) {
            Some(hit) => {
                let camera = self.persist_camera()?;
                let id = self.store.insert_pick(screen, hit.point, camera)?;
                let pick = Pick {
                    id,
                    screen,
                    world: hit.point,
                    camera,
                };
                self.picks.push(pick);
                Some(pick)
            }
            None => {
                debug!("Pick at {screen} missed the surface");
                None
            }
        };

        let attachment = match self.attachment {
            AttachmentMode::Envelope => self.attach()?,
            AttachmentMode::Independent => None,
        };
        Ok(PickOutcome { pick, attachment })
    }

    /// Delete the pick closest to the ray under `screen`.
    ///
    /// In [`DeletionMode::ActiveCamera`] a camera without picks is removed
    /// instead, unless it is the model's last, and the session moves on to
    /// the next camera.
    pub fn delete_nearest(&mut self, screen: Vec2) -> Result<DeleteOutcome, SessionError> {
        let ray = self.view().screen_ray(screen);
        let nearest = match self.deletion {
            DeletionMode::AllCameras => self
                .picks
                .iter()
                .min_by(|a, b| {
                    ray_point_distance(&ray, a.world).total_cmp(&ray_point_distance(&ray, b.world))
                })
                .copied(),
            DeletionMode::ActiveCamera => {
                let Some(camera) = self.camera else {
                    return Ok(DeleteOutcome::Nothing);
                };
                let nearest = self
                    .picks
                    .for_camera(camera)
                    .min_by(|a, b| {
                        ray_point_distance(&ray, a.world)
                            .total_cmp(&ray_point_distance(&ray, b.world))
                    })
                    .copied();
                if nearest.is_none() {
                    return self.remove_active_camera(camera);
                }
                nearest
            }
        };

        let Some(pick) = nearest else {
            return Ok(DeleteOutcome::Nothing);
        };
        self.store.delete_pick(pick.id)?;
        self.picks.remove(pick.id);
        debug!("Deleted pick {}", pick.id);
        Ok(DeleteOutcome::Deleted(pick))
    }

    fn remove_active_camera(&mut self, camera: CameraId) -> Result<DeleteOutcome, SessionError> {
        match self.store.remove_camera(camera) {
            Ok(()) => {}
            Err(StoreError::LastCamera(_)) => {
                debug!("Keeping camera {camera}, it is the last one");
                return Ok(DeleteOutcome::Nothing);
            }
            Err(e) => return Err(e.into()),
        }
        let active = self.store.neighbor_camera(self.model, camera, Direction::Next)?;
        self.select_camera(active)?;
        info!("Removed unused camera {camera}, now on camera {active}");
        Ok(DeleteOutcome::CameraRemoved {
            removed: camera,
            active,
        })
    }

    pub fn toggle_deletion_mode(&mut self) -> DeletionMode {
        self.deletion = self.deletion.toggled();
        self.deletion
    }

    /// Flip the attachment mode; entering envelope mode attaches right away.
    pub fn toggle_attachment_mode(&mut self) -> Result<Option<AttachReport>, SessionError> {
        self.attachment = self.attachment.toggled();
        match self.attachment {
            AttachmentMode::Envelope => self.attach(),
            AttachmentMode::Independent => Ok(None),
        }
    }

    /// Attach the active camera's picks.
    ///
    /// Skipped while the camera is dirty, since its picks were made from the
    /// stored pose rather than the current one.
    pub fn attach(&mut self) -> Result<Option<AttachReport>, SessionError> {
        let Some(camera) = self.camera.filter(|_| !self.dirty) else {
            debug!("No clean active camera, skipping attachment");
            return Ok(None);
        };
        let view = self.view();
        let report = attach_polygon(
            &mut self.picks,
            camera,
            &view,
            &self.surface,
            &mut self.store,
            &self.config,
        )?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::TriangleMesh;
    use crate::store::MemoryStore;
    use glam::Vec3;

    const MODEL: ModelId = ModelId(7);
    const CENTER: Vec2 = Vec2::new(600.0, 400.0);

    fn ground() -> TriangleMesh {
        let a = Vec3::new(-10.0, 0.0, -10.0);
        let b = Vec3::new(10.0, 0.0, -10.0);
        let c = Vec3::new(10.0, 0.0, 10.0);
        let d = Vec3::new(-10.0, 0.0, 10.0);
        TriangleMesh::from_triangles(&[[a, b, c], [a, c, d]])
    }

    fn session() -> PickSession<MemoryStore, TriangleMesh> {
        PickSession::open(
            MemoryStore::new(),
            ground(),
            MODEL,
            DisplayConfig::default(),
            AttachConfig::default(),
        )
        .unwrap()
    }

    fn other_pose() -> CameraPose {
        CameraPose {
            position: Vec3::new(-6.0, 12.0, 4.0),
            ..CameraPose::default()
        }
    }

    /// Corners of a screen square around the center, in the order the
    /// polygon test expects
    fn square_screens() -> [Vec2; 4] {
        [
            Vec2::new(540.0, 340.0),
            Vec2::new(660.0, 340.0),
            Vec2::new(660.0, 460.0),
            Vec2::new(540.0, 460.0),
        ]
    }

    #[test]
    fn test_new_model_starts_dirty() {
        let s = session();
        assert!(s.is_dirty());
        assert_eq!(s.active_camera(), None);
        assert_eq!(*s.pose(), CameraPose::default());
        assert!(s.picks().is_empty());
    }

    #[test]
    fn test_pick_persists_dirty_camera_first() {
        let mut s = session();
        let outcome = s.pick(CENTER).unwrap();

        let pick = outcome.pick.unwrap();
        assert!(pick.world.length() < 1e-3);
        assert_eq!(Some(pick.camera), s.active_camera());
        assert!(!s.is_dirty());
        assert!(s.is_highlighted(&pick));
        assert_eq!(s.store().cameras_for_model(MODEL).unwrap().len(), 1);
        assert!(outcome.attachment.is_none());
    }

    #[test]
    fn test_missed_pick_keeps_camera_dirty() {
        let mut s = session();
        let outcome = s.pick(Vec2::new(600.0, 0.0)).unwrap();
        assert!(outcome.pick.is_none());
        assert!(s.is_dirty());
        assert!(s.store().cameras_for_model(MODEL).unwrap().is_empty());
    }

    #[test]
    fn test_moving_camera_creates_new_camera_on_pick() {
        let mut s = session();
        let first = s.pick(CENTER).unwrap().pick.unwrap();

        s.move_camera(other_pose());
        assert!(s.is_dirty());
        assert!(!s.is_highlighted(&first));

        let second = s.pick(CENTER).unwrap().pick.unwrap();
        assert_ne!(first.camera, second.camera);
        assert!(!s.is_highlighted(&first));
        assert!(s.is_highlighted(&second));
        assert_eq!(s.store().cameras_for_model(MODEL).unwrap().len(), 2);
    }

    #[test]
    fn test_reopen_loads_first_camera_clean() {
        let mut s = session();
        s.pick(CENTER).unwrap();
        let camera = s.active_camera();
        let store = s.into_store();

        let reopened =
            PickSession::open(store, ground(), MODEL, DisplayConfig::default(), AttachConfig::default())
                .unwrap();
        assert_eq!(reopened.active_camera(), camera);
        assert!(!reopened.is_dirty());
        assert_eq!(reopened.picks().len(), 1);
    }

    #[test]
    fn test_cycle_cameras_wraps() {
        let mut s = session();
        let a = s.pick(CENTER).unwrap().pick.unwrap().camera;
        s.move_camera(other_pose());
        let b = s.pick(CENTER).unwrap().pick.unwrap().camera;

        assert_eq!(s.next_camera().unwrap(), a);
        assert_eq!(*s.pose(), CameraPose::default());
        assert_eq!(s.next_camera().unwrap(), b);
        assert_eq!(s.previous_camera().unwrap(), a);
        assert_eq!(s.previous_camera().unwrap(), b);
    }

    #[test]
    fn test_cycle_without_cameras_fails() {
        let mut s = session();
        assert!(matches!(
            s.next_camera(),
            Err(SessionError::Store(StoreError::NoCameras(MODEL)))
        ));
    }

    #[test]
    fn test_delete_nearest_any_camera() {
        let mut s = session();
        let near = s.pick(CENTER).unwrap().pick.unwrap();
        s.pick(Vec2::new(700.0, 500.0)).unwrap();
        s.move_camera(other_pose());
        let foreign = s.pick(Vec2::new(500.0, 300.0)).unwrap().pick.unwrap();

        assert_eq!(s.toggle_deletion_mode(), DeletionMode::AllCameras);
        s.select_camera(near.camera).unwrap();
        assert_eq!(s.delete_nearest(CENTER).unwrap(), DeleteOutcome::Deleted(near));

        // Picks of other cameras qualify too
        let ray = s.view().screen_ray(s.view().world_to_screen(foreign.world).unwrap());
        assert!(ray_point_distance(&ray, foreign.world) < 1e-3);
        let outcome = s
            .delete_nearest(s.view().world_to_screen(foreign.world).unwrap())
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(foreign));
        assert_eq!(s.picks().len(), 1);
        assert_eq!(s.store().picks_for_model(MODEL).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_active_camera_then_remove_it() {
        let mut s = session();
        let a = s.pick(CENTER).unwrap().pick.unwrap();
        s.move_camera(other_pose());
        let b = s.pick(CENTER).unwrap().pick.unwrap();
        assert_eq!(s.deletion_mode(), DeletionMode::ActiveCamera);

        assert_eq!(s.delete_nearest(CENTER).unwrap(), DeleteOutcome::Deleted(b));
        assert_eq!(
            s.delete_nearest(CENTER).unwrap(),
            DeleteOutcome::CameraRemoved {
                removed: b.camera,
                active: a.camera
            }
        );
        assert_eq!(s.active_camera(), Some(a.camera));

        assert_eq!(s.delete_nearest(CENTER).unwrap(), DeleteOutcome::Deleted(a));
        // The last camera stays
        assert_eq!(s.delete_nearest(CENTER).unwrap(), DeleteOutcome::Nothing);
        assert_eq!(s.store().cameras_for_model(MODEL).unwrap(), vec![a.camera]);
    }

    #[test]
    fn test_toggle_to_envelope_attaches() {
        let mut s = session();
        for screen in square_screens() {
            assert!(s.pick(screen).unwrap().pick.is_some());
        }

        let report = s.toggle_attachment_mode().unwrap().unwrap();
        assert_eq!(s.attachment_mode(), AttachmentMode::Envelope);
        assert_eq!(report.updated.len(), 4);
        for pick in s.picks().iter() {
            assert!(pick.world.y.abs() < 1e-3);
        }

        assert!(s.toggle_attachment_mode().unwrap().is_none());
    }

    #[test]
    fn test_envelope_mode_attaches_after_each_pick() {
        let mut s = PickSession::open(
            MemoryStore::new(),
            ground(),
            MODEL,
            DisplayConfig::default(),
            AttachConfig {
                mode: AttachmentMode::Envelope,
                ..AttachConfig::default()
            },
        )
        .unwrap();

        let outcome = s.pick(CENTER).unwrap();
        assert_eq!(outcome.attachment.map(|r| r.picks_considered), Some(1));

        s.pick(Vec2::new(700.0, 450.0)).unwrap();
        let outcome = s.pick(Vec2::new(600.0, 0.0)).unwrap();
        assert!(outcome.pick.is_none());
        let report = outcome.attachment.unwrap();
        assert_eq!(report.boundary.len(), 2);
        assert_eq!(report.updated.len(), 2);
    }

    #[test]
    fn test_dirty_camera_skips_attach() {
        let mut s = session();
        s.pick(CENTER).unwrap();
        s.move_camera(other_pose());
        assert!(s.attach().unwrap().is_none());
    }
}
