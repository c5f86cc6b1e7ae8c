//! Shared configuration for Tangent
//!
//! This crate provides the single source of truth for viewport dimensions
//! and attachment settings shared by the picking library and the command-line
//! host. Every setting can be overridden from the environment:
//! - `TANGENT_VIEWPORT=WxH` - viewport size in pixels
//! - `TANGENT_GRID=WxH` - attachment sampling grid
//! - `TANGENT_ATTACHMENT=envelope|independent` - attachment mode

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default viewport width in pixels
pub const DEFAULT_WIDTH: u32 = 1200;

/// Default viewport height in pixels
pub const DEFAULT_HEIGHT: u32 = 800;

/// Default number of attachment samples along each screen axis
pub const DEFAULT_GRID: u32 = 10;

/// Display configuration for the viewport picks are made in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse from environment variable TANGENT_VIEWPORT
    pub fn from_env() -> Self {
        match std::env::var("TANGENT_VIEWPORT") {
            Ok(value) => match parse_dimensions(&value) {
                Some((width, height)) => Self::new(width, height),
                None => {
                    warn!("Ignoring malformed TANGENT_VIEWPORT={value:?}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Get width as f32 for calculations
    pub fn width_f32(&self) -> f32 {
        self.width as f32
    }

    /// Get height as f32 for calculations
    pub fn height_f32(&self) -> f32 {
        self.height as f32
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width_f32() / self.height_f32()
        }
    }
}

/// How picks react to new selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentMode {
    /// Each pick keeps the surface point it was selected at
    #[default]
    Independent,
    /// The active camera's picks are re-attached to a fitted tangent
    /// primitive after every selection
    Envelope,
}

impl AttachmentMode {
    /// Parse from environment variable TANGENT_ATTACHMENT
    pub fn from_env() -> Self {
        match std::env::var("TANGENT_ATTACHMENT").as_deref() {
            Ok("envelope") => Self::Envelope,
            Ok("independent") | Err(_) => Self::Independent,
            Ok(other) => {
                warn!("Unknown TANGENT_ATTACHMENT={other:?}, using independent");
                Self::Independent
            }
        }
    }

    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            Self::Independent => Self::Envelope,
            Self::Envelope => Self::Independent,
        }
    }
}

/// Attachment sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachConfig {
    /// Samples across the horizontal extent of the picks' bounding box
    pub grid_width: u32,
    /// Samples across the vertical extent of the picks' bounding box
    pub grid_height: u32,
    /// Mode the session starts in
    pub mode: AttachmentMode,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID,
            grid_height: DEFAULT_GRID,
            mode: AttachmentMode::default(),
        }
    }
}

impl AttachConfig {
    /// Create an attach config with the given grid and the default mode
    pub fn with_grid(grid_width: u32, grid_height: u32) -> Self {
        Self {
            grid_width,
            grid_height,
            ..Self::default()
        }
    }

    /// Parse from environment variables TANGENT_GRID and TANGENT_ATTACHMENT
    pub fn from_env() -> Self {
        let mode = AttachmentMode::from_env();
        match std::env::var("TANGENT_GRID") {
            Ok(value) => match parse_dimensions(&value) {
                Some((grid_width, grid_height)) => Self {
                    grid_width,
                    grid_height,
                    mode,
                },
                None => {
                    warn!("Ignoring malformed TANGENT_GRID={value:?}");
                    Self {
                        mode,
                        ..Self::default()
                    }
                }
            },
            Err(_) => Self {
                mode,
                ..Self::default()
            },
        }
    }
}

/// Combined configuration for the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TangentConfig {
    pub display: DisplayConfig,
    pub attach: AttachConfig,
}

impl TangentConfig {
    /// Read every section from the environment
    pub fn from_env() -> Self {
        Self {
            display: DisplayConfig::from_env(),
            attach: AttachConfig::from_env(),
        }
    }
}

/// Parse `WxH` (also accepts `W,H`) into a pair of non-zero sizes
pub fn parse_dimensions(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once(['x', 'X', ','])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}
