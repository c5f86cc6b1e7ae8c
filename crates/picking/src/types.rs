use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{DEGENERATE_EPSILON, MAX_BOUNDARY_POINTS};
use crate::intersection::triangle_is_thin;

/// A half-line with a non-zero (not necessarily unit) direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Persisted identifier of a pick record
    PickId
);
row_id!(
    /// Persisted identifier of a camera pose
    CameraId
);
row_id!(
    /// Identifier of the surface model picks are made on
    ModelId
);

/// A user-selected surface point tied to the camera it was selected from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub id: PickId,
    /// Screen position the pick was made at, in viewport pixels
    pub screen: Vec2,
    /// Surface point in world space
    pub world: Vec3,
    /// Camera that was active when the pick was made
    pub camera: CameraId,
}

/// Ordered, growable collection of picks.
///
/// Identity is the persisted [`PickId`]; positions shift on removal but the
/// relative order of the remaining picks is preserved, which the polygon
/// interior test relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickSet {
    picks: Vec<Pick>,
}

impl PickSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pick> {
        self.picks.iter()
    }

    pub fn push(&mut self, pick: Pick) {
        self.picks.push(pick);
    }

    pub fn get(&self, id: PickId) -> Option<&Pick> {
        self.picks.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PickId) -> Option<&mut Pick> {
        self.picks.iter_mut().find(|p| p.id == id)
    }

    /// Remove a pick by id, keeping the order of the others.
    pub fn remove(&mut self, id: PickId) -> Option<Pick> {
        let index = self.picks.iter().position(|p| p.id == id)?;
        Some(self.picks.remove(index))
    }

    /// Swap in the stored replacement of pick `old`, keeping its position.
    pub fn replace_id(&mut self, old: PickId, replacement: Pick) -> bool {
        match self.get_mut(old) {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    /// Picks owned by `camera`, in stored order
    pub fn for_camera(&self, camera: CameraId) -> impl Iterator<Item = &Pick> {
        self.picks.iter().filter(move |p| p.camera == camera)
    }

    pub fn count_for_camera(&self, camera: CameraId) -> usize {
        self.for_camera(camera).count()
    }

    pub fn as_slice(&self) -> &[Pick] {
        &self.picks
    }
}

impl From<Vec<Pick>> for PickSet {
    fn from(picks: Vec<Pick>) -> Self {
        Self { picks }
    }
}

impl FromIterator<Pick> for PickSet {
    fn from_iter<I: IntoIterator<Item = Pick>>(iter: I) -> Self {
        Self {
            picks: iter.into_iter().collect(),
        }
    }
}

/// Shape a [`Boundary`] currently describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Empty,
    Point,
    Segment,
    Plane,
}

/// A point, segment or triangle-spanned plane fit to sampled surface hits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Boundary {
    points: [Vec3; MAX_BOUNDARY_POINTS],
    len: usize,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a boundary from up to three points, ignoring any extra.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut boundary = Self::new();
        for &p in points.iter().take(MAX_BOUNDARY_POINTS) {
            boundary.points[boundary.len] = p;
            boundary.len += 1;
        }
        boundary
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points[..self.len]
    }

    pub fn kind(&self) -> BoundaryKind {
        match self.len {
            0 => BoundaryKind::Empty,
            1 => BoundaryKind::Point,
            2 => BoundaryKind::Segment,
            _ => BoundaryKind::Plane,
        }
    }

    /// Add a seed point directly.
    ///
    /// Refuses points that would leave the primitive degenerate: a second
    /// point on top of the first, or a third point on (or very nearly on) the
    /// line of the first two. Returns whether the point was taken.
    pub fn push_seed(&mut self, p: Vec3) -> bool {
        let accepted = match self.len {
            0 => true,
            1 => self.points[0].distance_squared(p) > DEGENERATE_EPSILON,
            2 => !triangle_is_thin(&[self.points[0], self.points[1], p]),
            _ => false,
        };
        if accepted {
            self.points[self.len] = p;
            self.len += 1;
        }
        accepted
    }

    pub fn as_segment_mut(&mut self) -> Option<&mut [Vec3; 2]> {
        if self.len != 2 {
            return None;
        }
        <&mut [Vec3; 2]>::try_from(&mut self.points[..2]).ok()
    }

    pub fn as_plane_mut(&mut self) -> Option<&mut [Vec3; 3]> {
        if self.len != 3 {
            return None;
        }
        Some(&mut self.points)
    }
}

/// Result of intersecting a ray with a boundary primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryHit {
    /// Ray parameter of the hit; world distance when the direction is unit
    pub distance: f32,
    pub point: Vec3,
}

/// Result of a ray-mesh intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// World position of the hit
    pub point: Vec3,
    /// World distance from the ray origin
    pub distance: f32,
    /// Index of the triangle that was hit
    pub triangle: u32,
    /// Geometric normal of that triangle in world space
    pub normal: Vec3,
}
