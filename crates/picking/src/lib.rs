//! Tangent picking - surface picks reconciled onto fitted tangent primitives
//!
//! This crate provides the geometry and bookkeeping behind multi-camera
//! surface picking:
//! - [`orientation`] - 2D turn test and ray/point distance
//! - [`intersection`] - ray against a segment or plane boundary primitive
//! - [`advance`] - greedy tightening of a boundary primitive toward the eye
//! - [`camera`] - camera poses and screen-to-world rays
//! - [`raycast`] - ray/mesh intersection for the picked surface
//! - [`store`] - persistence collaborator for picks and cameras
//! - [`attach`] - grid sampling and re-projection of a camera's picks
//! - [`session`] - frame-loop editing state (pick, delete, cycle cameras)

pub mod advance;
pub mod attach;
pub mod camera;
pub mod constants;
pub mod intersection;
pub mod orientation;
pub mod raycast;
pub mod session;
pub mod store;
pub mod types;

pub use advance::*;
pub use attach::*;
pub use camera::*;
pub use constants::*;
pub use intersection::*;
pub use orientation::*;
pub use raycast::*;
pub use session::*;
pub use store::*;
pub use types::*;

pub use tangent_config::{AttachConfig, AttachmentMode, DisplayConfig};
