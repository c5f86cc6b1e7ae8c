//! Host configuration: shared settings plus the model being edited

use picking::ModelId;
use tangent_config::{TangentConfig, parse_dimensions};
use tracing::warn;

/// Model a store is opened for when none is given
pub const DEFAULT_MODEL: u64 = 0;

/// Parse the edited model from environment variable TANGENT_MODEL
pub fn model_from_env() -> ModelId {
    match std::env::var("TANGENT_MODEL") {
        Ok(value) => value.trim().parse().map(ModelId).unwrap_or_else(|_| {
            warn!("Ignoring malformed TANGENT_MODEL={value:?}");
            ModelId(DEFAULT_MODEL)
        }),
        Err(_) => ModelId(DEFAULT_MODEL),
    }
}

/// Host configuration
#[derive(Debug, Clone, Copy)]
pub struct HostConfig {
    pub tangent: TangentConfig,
    pub model: ModelId,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tangent: TangentConfig::from_env(),
            model: model_from_env(),
        }
    }
}

impl HostConfig {
    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(mut self, model: Option<u64>, grid: Option<(u32, u32)>) -> Self {
        if let Some(model) = model {
            self.model = ModelId(model);
        }
        if let Some((width, height)) = grid {
            self.tangent.attach.grid_width = width;
            self.tangent.attach.grid_height = height;
        }
        self
    }
}

/// `clap` value parser for `WxH` grid sizes
pub fn parse_grid(value: &str) -> Result<(u32, u32), String> {
    parse_dimensions(value).ok_or_else(|| format!("expected WxH with non-zero sizes, got {value:?}"))
}
