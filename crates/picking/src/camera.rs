//! Camera poses and screen/world conversion.
//!
//! Screen positions are viewport pixels with the origin at the top-left
//! corner and Y growing downward. A screen point is turned into a world ray
//! by spanning the view plane with the camera's right and up vectors, the
//! same construction used for projecting a canvas from a camera.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tangent_config::DisplayConfig;

use crate::constants::CAMERA_NEAR;
use crate::types::Ray;

/// Projection model of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Perspective,
    /// Parallel rays; `fovy` is the view height in world units
    Orthographic,
}

/// A camera pose as persisted alongside picks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees (perspective) or view height in
    /// world units (orthographic)
    pub fovy: f32,
    pub projection: Projection,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(10.0, 10.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 45.0,
            projection: Projection::Perspective,
        }
    }
}

impl CameraPose {
    /// Orthonormal (forward, right, up) frame of the camera.
    ///
    /// An `up` vector parallel to the view direction is replaced by the axis
    /// least aligned with it.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward
            .cross(self.up)
            .try_normalize()
            .unwrap_or_else(|| arbitrary_perpendicular(forward));
        let up = right.cross(forward);
        (forward, right, up)
    }

    /// Half extents of the view plane at unit distance (perspective) or of
    /// the view volume (orthographic).
    fn half_extents(&self, aspect: f32) -> Vec2 {
        let half_h = match self.projection {
            Projection::Perspective => (self.fovy.to_radians() / 2.0).tan(),
            Projection::Orthographic => self.fovy / 2.0,
        };
        Vec2::new(half_h * aspect, half_h)
    }
}

/// Find an arbitrary unit vector perpendicular to `v`.
fn arbitrary_perpendicular(v: Vec3) -> Vec3 {
    let axis = if v.x.abs() < v.y.abs() {
        if v.x.abs() < v.z.abs() { Vec3::X } else { Vec3::Z }
    } else if v.y.abs() < v.z.abs() {
        Vec3::Y
    } else {
        Vec3::Z
    };
    v.cross(axis).normalize()
}

/// Anything that can turn a screen position into a world ray.
pub trait ScreenRays {
    /// Ray through the given screen position
    fn screen_ray(&self, screen: Vec2) -> Ray;

    /// Observer position the fitted primitives are biased toward
    fn eye(&self) -> Vec3;
}

/// A camera pose bound to a viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub pose: CameraPose,
    pub display: DisplayConfig,
}

impl CameraView {
    pub fn new(pose: CameraPose, display: DisplayConfig) -> Self {
        Self { pose, display }
    }

    /// Screen pixel to normalized device coordinates (-1..1, Y up)
    pub fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        let w = self.display.width_f32().max(1.0);
        let h = self.display.height_f32().max(1.0);
        Vec2::new(2.0 * screen.x / w - 1.0, 1.0 - 2.0 * screen.y / h)
    }

    /// Normalized device coordinates to screen pixel
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) / 2.0 * self.display.width_f32(),
            (1.0 - ndc.y) / 2.0 * self.display.height_f32(),
        )
    }

    /// Project a world point to the screen.
    ///
    /// Returns `None` for points behind a perspective camera.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let (forward, right, up) = self.pose.basis();
        let half = self.pose.half_extents(self.display.aspect());
        let v = world - self.pose.position;
        let ndc = match self.pose.projection {
            Projection::Perspective => {
                let depth = v.dot(forward);
                if depth <= 0.0 {
                    return None;
                }
                Vec2::new(
                    v.dot(right) / (depth * half.x),
                    v.dot(up) / (depth * half.y),
                )
            }
            Projection::Orthographic => Vec2::new(v.dot(right) / half.x, v.dot(up) / half.y),
        };
        Some(self.ndc_to_screen(ndc))
    }
}

impl ScreenRays for CameraView {
    fn screen_ray(&self, screen: Vec2) -> Ray {
        let (forward, right, up) = self.pose.basis();
        let half = self.pose.half_extents(self.display.aspect());
        let ndc = self.screen_to_ndc(screen);
        let offset = right * (ndc.x * half.x) + up * (ndc.y * half.y);

        match self.pose.projection {
            Projection::Perspective => {
                Ray::new(self.pose.position, (forward + offset).normalize())
            }
            Projection::Orthographic => {
                Ray::new(self.pose.position + forward * CAMERA_NEAR + offset, forward)
            }
        }
    }

    fn eye(&self) -> Vec3 {
        self.pose.position
    }
}
