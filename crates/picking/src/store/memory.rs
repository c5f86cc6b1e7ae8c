//! In-memory pick store with JSON snapshots.

use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PickStore, StoreError};
use crate::camera::CameraPose;
use crate::types::{CameraId, ModelId, Pick, PickId};

/// A stored camera pose and the model it looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub id: CameraId,
    pub model: ModelId,
    pub pose: CameraPose,
}

/// Rows kept in stored order.
///
/// Identifiers are handed out monotonically and never reused. Cameras stay
/// sorted by identifier; a replaced pick takes its predecessor's slot, so
/// pick order is positional and survives snapshots as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    cameras: Vec<CameraRecord>,
    #[serde(default)]
    picks: Vec<Pick>,
    #[serde(default)]
    next_pick_id: u64,
    #[serde(default)]
    next_camera_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a snapshot written by [`MemoryStore::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path.as_ref())?;
        let mut store: Self = serde_json::from_str(&text)?;
        store.normalize();
        debug!(
            "Loaded {} cameras and {} picks from {}",
            store.cameras.len(),
            store.picks.len(),
            path.as_ref().display()
        );
        Ok(store)
    }

    /// Load a snapshot, or start empty when the file does not exist yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), text)?;
        debug!("Saved pick store to {}", path.as_ref().display());
        Ok(())
    }

    pub fn pick_count(&self) -> usize {
        self.picks.len()
    }

    pub fn cameras(&self) -> &[CameraRecord] {
        &self.cameras
    }

    fn model_of(&self, camera: CameraId) -> Option<ModelId> {
        self.cameras.iter().find(|c| c.id == camera).map(|c| c.model)
    }

    /// Restore camera order and id counters of a hand-edited snapshot.
    fn normalize(&mut self) {
        self.cameras.sort_by_key(|c| c.id);
        let max_pick = self.picks.iter().map(|p| p.id.0 + 1).max().unwrap_or(0);
        let max_camera = self.cameras.last().map_or(0, |c| c.id.0 + 1);
        self.next_pick_id = self.next_pick_id.max(max_pick);
        self.next_camera_id = self.next_camera_id.max(max_camera);
    }
}

impl PickStore for MemoryStore {
    fn insert_pick(
        &mut self,
        screen: Vec2,
        world: Vec3,
        camera: CameraId,
    ) -> Result<PickId, StoreError> {
        let id = PickId(self.next_pick_id);
        self.next_pick_id += 1;
        self.picks.push(Pick {
            id,
            screen,
            world,
            camera,
        });
        debug!("Inserted pick {id} for camera {camera}");
        Ok(id)
    }

    fn delete_pick(&mut self, id: PickId) -> Result<(), StoreError> {
        let index = self
            .picks
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::PickNotFound(id))?;
        self.picks.remove(index);
        debug!("Deleted pick {id}");
        Ok(())
    }

    fn replace_pick(
        &mut self,
        old: PickId,
        screen: Vec2,
        world: Vec3,
        camera: CameraId,
    ) -> Result<PickId, StoreError> {
        let index = self
            .picks
            .iter()
            .position(|p| p.id == old)
            .ok_or(StoreError::PickNotFound(old))?;
        let id = PickId(self.next_pick_id);
        self.next_pick_id += 1;
        self.picks[index] = Pick {
            id,
            screen,
            world,
            camera,
        };
        debug!("Replaced pick {old} with {id}");
        Ok(id)
    }

    fn picks_for_camera(&self, camera: CameraId) -> Result<Vec<Pick>, StoreError> {
        Ok(self
            .picks
            .iter()
            .filter(|p| p.camera == camera)
            .copied()
            .collect())
    }

    fn picks_for_model(&self, model: ModelId) -> Result<Vec<Pick>, StoreError> {
        Ok(self
            .picks
            .iter()
            .filter(|p| self.model_of(p.camera) == Some(model))
            .copied()
            .collect())
    }

    fn insert_camera(&mut self, pose: CameraPose, model: ModelId) -> Result<CameraId, StoreError> {
        let id = CameraId(self.next_camera_id);
        self.next_camera_id += 1;
        self.cameras.push(CameraRecord { id, model, pose });
        debug!("Inserted camera {id} for model {model}");
        Ok(id)
    }

    fn camera(&self, id: CameraId) -> Result<CameraPose, StoreError> {
        self.cameras
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.pose)
            .ok_or(StoreError::CameraNotFound(id))
    }

    fn cameras_for_model(&self, model: ModelId) -> Result<Vec<CameraId>, StoreError> {
        Ok(self
            .cameras
            .iter()
            .filter(|c| c.model == model)
            .map(|c| c.id)
            .collect())
    }

    fn remove_camera(&mut self, id: CameraId) -> Result<(), StoreError> {
        let model = self.model_of(id).ok_or(StoreError::CameraNotFound(id))?;
        let siblings = self.cameras.iter().filter(|c| c.model == model).count();
        if siblings <= 1 {
            return Err(StoreError::LastCamera(id));
        }
        self.cameras.retain(|c| c.id != id);
        debug!("Removed camera {id}");
        Ok(())
    }
}
