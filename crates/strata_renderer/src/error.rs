//! Error types for scene assembly and rendering.

use strata_core::{ConfigError, TextureError};
use thiserror::Error;

use crate::worker::WorkerStatus;

/// Errors raised while assembling a scene, before any rendering starts.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Cannot build a BVH from an empty primitive list")]
    EmptyPrimitiveList,

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Invalid scene: {0}")]
    Invalid(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Errors that stop a render from starting or a tile from streaming.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Worker is {0:?}, expected a completed render setup")]
    NotReady(WorkerStatus),

    #[error("All {0} cores of the worker are rendering tiles")]
    AllCoresBusy(usize),

    #[error("Tile [{x0},{y0}]-[{x1},{y1}] lies outside the {width}x{height} image")]
    TileOutOfBounds {
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        width: u32,
        height: u32,
    },

    #[error("Tile stream receiver hung up")]
    StreamClosed,
}

pub type RenderResult<T> = Result<T, RenderError>;
