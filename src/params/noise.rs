//! Height function parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Fractal noise and river-carving parameters for the height function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Amplitude of the first octave
    pub start_amplitude: f64,

    /// Frequency of the first octave (cycles per world unit)
    pub start_frequency: f64,

    /// Number of summed noise layers (>= 1)
    pub octaves: u32,

    /// Amplitude multiplier per octave
    pub persistence: f64,

    /// Frequency multiplier per octave
    pub lacunarity: f64,

    /// Strength of valley carving (0 = none, 1 = full)
    pub carve_amplitude: f64,

    /// Frequency of the carving field
    pub carve_frequency: f64,

    /// Height of a fully raised sample
    pub terrain_scale: f64,

    /// Lower clamp for final heights
    pub min_height: f64,

    /// Upper clamp for final heights
    pub max_height: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            start_amplitude: 1.0,
            start_frequency: 0.01,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            carve_amplitude: 0.6,
            carve_frequency: 0.005,
            terrain_scale: 40.0,
            min_height: 0.0,
            max_height: 40.0,
        }
    }
}

impl NoiseParams {
    /// Validate parameters so that every computed height is finite and
    /// lies in `[min_height, max_height]`.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("start_amplitude", self.start_amplitude),
            ("start_frequency", self.start_frequency),
            ("persistence", self.persistence),
            ("lacunarity", self.lacunarity),
            ("carve_amplitude", self.carve_amplitude),
            ("carve_frequency", self.carve_frequency),
            ("terrain_scale", self.terrain_scale),
            ("min_height", self.min_height),
            ("max_height", self.max_height),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(TerrainError::invalid(field, format!("must be finite, got {value}")));
            }
        }

        if self.octaves == 0 {
            return Err(TerrainError::invalid("octaves", "must be at least 1"));
        }
        if self.start_amplitude <= 0.0 {
            return Err(TerrainError::invalid("start_amplitude", "must be > 0"));
        }
        if self.persistence < 0.0 {
            return Err(TerrainError::invalid("persistence", "must be >= 0"));
        }
        if self.min_height > self.max_height {
            return Err(TerrainError::invalid(
                "min_height",
                format!(
                    "min_height {} exceeds max_height {}",
                    self.min_height, self.max_height
                ),
            ));
        }
        Ok(())
    }

    /// Height span covered by the clamp range
    pub fn height_range(&self) -> f64 {
        self.max_height - self.min_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_noise_params_are_valid() {
        assert!(NoiseParams::default().validate().is_ok());
    }

    #[test]
    fn test_noise_params_rejections() {
        let cases: Vec<(&str, NoiseParams)> = vec![
            ("octaves", NoiseParams { octaves: 0, ..Default::default() }),
            ("start_amplitude", NoiseParams { start_amplitude: 0.0, ..Default::default() }),
            ("persistence", NoiseParams { persistence: -0.5, ..Default::default() }),
            ("min_height", NoiseParams { min_height: 10.0, max_height: 5.0, ..Default::default() }),
            ("lacunarity", NoiseParams { lacunarity: f64::INFINITY, ..Default::default() }),
        ];

        for (expected, params) in cases {
            match params.validate() {
                Err(TerrainError::InvalidParameter { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} rejection, got {other:?}"),
            }
        }
    }
}
