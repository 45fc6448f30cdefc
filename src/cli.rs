//! Command-line argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::Result;
use crate::params::TerrainConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "terrain_morph")]
#[command(about = "Seeded procedural terrain generator with height morphing", long_about = None)]
pub struct Args {
    /// TOML terrain config (defaults are used for anything it omits)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Grid samples along x
    #[arg(long, value_name = "N")]
    pub width: Option<usize>,

    /// Grid samples along z
    #[arg(long, value_name = "N")]
    pub height: Option<usize>,

    /// Distance between adjacent samples (world units)
    #[arg(long, value_name = "UNITS")]
    pub spacing: Option<f32>,

    /// Permutation table seed
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Morph frames to simulate after generation
    #[arg(long, value_name = "N", default_value = "0")]
    pub frames: u32,

    /// Seconds per simulated frame
    #[arg(long, value_name = "SECONDS", default_value = "0.016")]
    pub frame_dt: f32,

    /// Write the finished mesh as Wavefront OBJ
    #[arg(long, value_name = "FILE")]
    pub obj: Option<PathBuf>,

    /// Write heights as a grayscale PNG
    #[arg(long, value_name = "FILE")]
    pub heightmap: Option<PathBuf>,

    /// Give up waiting for generation after this many milliseconds
    #[arg(long, value_name = "MS", default_value = "30000")]
    pub timeout_ms: u64,
}

impl Args {
    /// Build the terrain config: file first (if any), then flag overrides.
    pub fn terrain_config(&self) -> Result<TerrainConfig> {
        let mut config = match &self.config {
            Some(path) => TerrainConfig::load(path)?,
            None => TerrainConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid.width = width;
        }
        if let Some(height) = self.height {
            config.grid.height = height;
        }
        if let Some(spacing) = self.spacing {
            config.grid.spacing = spacing;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerrainError;

    #[test]
    fn test_flag_overrides() {
        let args = Args::parse_from([
            "terrain_morph",
            "--width",
            "16",
            "--height",
            "9",
            "--spacing",
            "2.5",
            "--seed",
            "7",
        ]);
        let config = args.terrain_config().unwrap();

        assert_eq!(config.grid.width, 16);
        assert_eq!(config.grid.height, 9);
        assert_eq!(config.grid.spacing, 2.5);
        assert_eq!(config.random_seed, 7);
        assert_eq!(args.frames, 0);
        assert_eq!(args.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.toml");
        std::fs::write(&path, "random_seed = 3\n[grid]\nwidth = 20\nheight = 20\n").unwrap();

        let args = Args::parse_from([
            "terrain_morph",
            "--config",
            path.to_str().unwrap(),
            "--width",
            "4",
        ]);
        let config = args.terrain_config().unwrap();

        assert_eq!(config.grid.width, 4);
        assert_eq!(config.grid.height, 20);
        assert_eq!(config.random_seed, 3);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::parse_from(["terrain_morph", "--width", "1"]);
        assert!(matches!(
            args.terrain_config(),
            Err(TerrainError::InvalidGrid { .. })
        ));
    }
}
