//! Parameter definitions with documented units and defaults.
//!
//! Everything a terrain instance is created from lives here:
//! - Grid layout (sample counts and spacing)
//! - Height function parameters (octaves, carving, clamps)
//! - Animation and display settings

mod grid;
mod noise;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::texture::{TextureLayer, MAX_TEXTURE_LAYERS};

// Re-export all types
pub use self::grid::GridParams;
pub use self::noise::NoiseParams;

/// Complete description of a terrain instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub grid: GridParams,

    pub noise: NoiseParams,

    /// Seed for the permutation table
    pub random_seed: u32,

    /// Seconds for a full prior-to-new height transition
    pub morph_time: f32,

    /// Start in wireframe display mode
    pub wireframe_enabled: bool,

    /// Height-banded ground textures (at most `MAX_TEXTURE_LAYERS`)
    pub texture_layers: Vec<TextureLayer>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid: GridParams::default(),
            noise: NoiseParams::default(),
            random_seed: 42,
            morph_time: 1.5,
            wireframe_enabled: false,
            texture_layers: Vec::new(),
        }
    }
}

impl TerrainConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded terrain config from {}", path.as_ref().display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.noise.validate()?;

        if !self.morph_time.is_finite() || self.morph_time < 0.0 {
            return Err(TerrainError::invalid(
                "morph_time",
                format!("must be finite and >= 0, got {}", self.morph_time),
            ));
        }
        if self.texture_layers.len() > MAX_TEXTURE_LAYERS {
            return Err(TerrainError::LayerCapacityExceeded {
                max: MAX_TEXTURE_LAYERS,
            });
        }
        for layer in &self.texture_layers {
            layer.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = TerrainConfig::from_toml_str(
            r#"
            random_seed = 7
            morph_time = 0.5

            [grid]
            width = 16
            height = 8

            [noise]
            octaves = 3
            carve_amplitude = 0.0

            [[texture_layers]]
            source = "textures/grass.png"
            min_height = 0.0
            max_height = 10.0
            tile_size = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.random_seed, 7);
        assert_eq!(config.grid.width, 16);
        assert_eq!(config.grid.height, 8);
        assert_eq!(config.grid.spacing, GridParams::default().spacing);
        assert_eq!(config.noise.octaves, 3);
        assert_eq!(config.noise.persistence, NoiseParams::default().persistence);
        assert_eq!(config.texture_layers.len(), 1);
        assert_eq!(config.texture_layers[0].source, "textures/grass.png");
    }

    #[test]
    fn test_invalid_toml_grid_is_rejected() {
        let result = TerrainConfig::from_toml_str("[grid]\nwidth = 1\n");
        assert!(matches!(result, Err(TerrainError::InvalidGrid { .. })));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = TerrainConfig::from_toml_str("grid = [");
        assert!(matches!(result, Err(TerrainError::Config(_))));
    }

    #[test]
    fn test_too_many_texture_layers() {
        let mut config = TerrainConfig::default();
        config.texture_layers = vec![TextureLayer::default(); MAX_TEXTURE_LAYERS + 1];
        assert!(matches!(
            config.validate(),
            Err(TerrainError::LayerCapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.toml");
        fs::write(&path, "random_seed = 99\n").unwrap();

        let config = TerrainConfig::load(&path).unwrap();
        assert_eq!(config.random_seed, 99);

        let missing = TerrainConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(TerrainError::Io(_))));
    }
}
