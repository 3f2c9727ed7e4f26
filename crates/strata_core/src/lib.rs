//! Strata Core - render settings and surface textures.
//!
//! This crate provides:
//!
//! - **Configuration**: `RenderConfig`, loadable from JSON, plus the
//!   background and sampler choices the integrator reads.
//! - **Textures**: constant, checker, Perlin noise and pre-decoded image
//!   textures behind the `Texture` trait.
//!
//! # Example
//!
//! ```ignore
//! use strata_core::RenderConfig;
//!
//! let config = RenderConfig::from_json_file("render.json")?;
//! println!("{}x{} @ {} spp", config.width, config.height, config.samples);
//! ```

pub mod config;
mod perlin;
pub mod texture;

// Re-export commonly used types
pub use config::{Background, ConfigError, ConfigResult, RenderConfig, SamplerKind, TileOrder};
pub use perlin::Perlin;
pub use texture::{
    CheckerTexture, ConstantTexture, ImageTexture, NoiseTexture, Texture, TextureError,
    TextureResult,
};
