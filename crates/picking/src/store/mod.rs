//! Persistence collaborator for picks and camera poses.
//!
//! Picks and cameras are rows with store-assigned identifiers. A pick is
//! never edited in place: re-projection replaces it, which hands out a fresh
//! identifier.

mod memory;

pub use memory::{CameraRecord, MemoryStore};

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::camera::CameraPose;
use crate::types::{CameraId, ModelId, Pick, PickId};

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Pick {0} not found")]
    PickNotFound(PickId),
    #[error("Camera {0} not found")]
    CameraNotFound(CameraId),
    #[error("Camera {0} is the last camera of its model")]
    LastCamera(CameraId),
    #[error("No cameras stored for model {0}")]
    NoCameras(ModelId),
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store snapshot error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which way to walk the camera list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Row-oriented store of picks and camera poses.
pub trait PickStore {
    /// Insert a pick and return its identifier
    fn insert_pick(&mut self, screen: Vec2, world: Vec3, camera: CameraId)
    -> Result<PickId, StoreError>;

    fn delete_pick(&mut self, id: PickId) -> Result<(), StoreError>;

    /// Replace `old` with a new row, returning the new identifier.
    ///
    /// The replacement takes `old`'s position in stored order, and a missing
    /// `old` fails without inserting anything.
    fn replace_pick(
        &mut self,
        old: PickId,
        screen: Vec2,
        world: Vec3,
        camera: CameraId,
    ) -> Result<PickId, StoreError>;

    /// Picks owned by `camera`, in stored order
    fn picks_for_camera(&self, camera: CameraId) -> Result<Vec<Pick>, StoreError>;

    /// Picks of every camera belonging to `model`, in stored order
    fn picks_for_model(&self, model: ModelId) -> Result<Vec<Pick>, StoreError>;

    fn insert_camera(&mut self, pose: CameraPose, model: ModelId) -> Result<CameraId, StoreError>;

    fn camera(&self, id: CameraId) -> Result<CameraPose, StoreError>;

    /// Cameras of `model`, in stored order
    fn cameras_for_model(&self, model: ModelId) -> Result<Vec<CameraId>, StoreError>;

    fn first_camera(&self, model: ModelId) -> Result<Option<CameraId>, StoreError> {
        Ok(self.cameras_for_model(model)?.first().copied())
    }

    /// The camera after (or before) `current` among `model`'s cameras.
    ///
    /// Wraps around to the first (or last) camera. `current` does not have to
    /// exist any more, which lets a caller move on from a removed camera.
    fn neighbor_camera(
        &self,
        model: ModelId,
        current: CameraId,
        direction: Direction,
    ) -> Result<CameraId, StoreError> {
        let cameras = self.cameras_for_model(model)?;
        let found = match direction {
            Direction::Next => cameras.iter().find(|&&id| id > current).or(cameras.first()),
            Direction::Previous => cameras
                .iter()
                .rev()
                .find(|&&id| id < current)
                .or(cameras.last()),
        };
        found.copied().ok_or(StoreError::NoCameras(model))
    }

    /// Remove a camera; the last camera of a model cannot be removed.
    fn remove_camera(&mut self, id: CameraId) -> Result<(), StoreError>;
}
