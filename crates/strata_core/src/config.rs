//! Render settings.
//!
//! `RenderConfig` gathers everything the scheduler and integrator need that
//! is not part of the scene itself. It deserializes from JSON with every
//! field optional, so a config file only has to name what it changes:
//!
//! ```json
//! { "width": 640, "height": 480, "samples": 256, "tile_order": "spiral" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_math::{Color, Vec3};
use thiserror::Error;

/// Errors that can occur while loading or validating a config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Order in which image strips are handed to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TileOrder {
    /// Top strip first.
    #[default]
    RowMajor,
    /// Centre strip first, then alternating outward.
    Spiral,
}

/// Which quantity each camera ray estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// Full path-traced radiance.
    #[default]
    Colour,
    /// Surface albedo of the first hit.
    Albedo,
    /// Shading normal of the first hit, mapped to [0, 1].
    Normal,
    /// Primitive outlines in `ink` over the background.
    WireFrame,
}

/// Radiance returned for rays that leave the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    Solid { color: [f64; 3] },
    Gradient { horizon: [f64; 3], zenith: [f64; 3] },
}

impl Background {
    pub fn solid(color: Color) -> Self {
        Background::Solid {
            color: color.to_array(),
        }
    }

    /// Radiance seen along `direction`.
    pub fn radiance(&self, direction: Vec3) -> Color {
        match self {
            Background::Solid { color } => Color::from_array(*color),
            Background::Gradient { horizon, zenith } => {
                let a = 0.5 * (direction.normalize_or_zero().y + 1.0);
                Color::from_array(*horizon) * (1.0 - a) + Color::from_array(*zenith) * a
            }
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid { color: [0.0; 3] }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output image width in pixels
    pub width: u32,
    /// Output image height in pixels
    pub height: u32,
    /// Samples per pixel
    pub samples: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Worker thread count; `None` uses every available core
    pub num_workers: Option<usize>,
    /// Seed for the per-strip random streams
    pub seed: u64,
    pub tile_order: TileOrder,
    pub sampler: SamplerKind,
    pub background: Background,
    /// Display gamma applied to each averaged pixel (1.0 disables it)
    pub gamma: f64,
    /// Line colour of the wireframe sampler
    pub ink: [f64; 3],
    /// Outline width for the wireframe sampler, relative to each primitive
    pub edge_width: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            samples: 100,
            max_depth: 50,
            num_workers: None,
            seed: 0,
            tile_order: TileOrder::RowMajor,
            sampler: SamplerKind::Colour,
            background: Background::default(),
            gamma: 2.0,
            ink: [1.0; 3],
            edge_width: 0.02,
        }
    }
}

impl RenderConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded render config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject settings the renderer cannot honour.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples == 0 {
            return Err(ConfigError::Invalid("samples must be at least 1".into()));
        }
        if self.num_workers == Some(0) {
            return Err(ConfigError::Invalid("num_workers must be at least 1".into()));
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        if !(self.edge_width > 0.0 && self.edge_width < 0.5) {
            return Err(ConfigError::Invalid(format!(
                "edge_width must lie in (0, 0.5), got {}",
                self.edge_width
            )));
        }
        Ok(())
    }

    /// Number of worker threads to spawn.
    pub fn worker_count(&self) -> usize {
        self.num_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
