//! Error type shared by the terrain library and the CLI.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::texture::LayerId;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TerrainError>;

/// Terrain generation errors
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid grid {width}x{height} with spacing {spacing}: need width >= 2, height >= 2, spacing > 0 and at most 2^32 - 1 vertices")]
    InvalidGrid {
        width: usize,
        height: usize,
        spacing: f32,
    },

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("terrain has no geometry yet; wait for the first generation to complete")]
    MissingGeometry,

    #[error("texture layer {0} not found")]
    LayerNotFound(LayerId),

    #[error("texture layer capacity exceeded (max {max})")]
    LayerCapacityExceeded { max: usize },

    #[error("invalid texture layer: {reason}")]
    InvalidTextureLayer { reason: String },

    #[error("generation did not finish within {0:?}")]
    GenerationTimeout(Duration),

    #[error("failed to spawn generation worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to parse terrain config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to write heightmap image: {0}")]
    Image(#[from] image::ImageError),
}

impl TerrainError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}
