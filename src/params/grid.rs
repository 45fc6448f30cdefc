//! Grid layout parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Sample grid layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Samples along the X axis (>= 2)
    pub width: usize,

    /// Samples along the Z axis (>= 2)
    pub height: usize,

    /// World distance between adjacent samples
    pub spacing: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            spacing: 1.0,
        }
    }
}

impl GridParams {
    pub fn new(width: usize, height: usize, spacing: f32) -> Self {
        Self {
            width,
            height,
            spacing,
        }
    }

    /// Reject grids that cannot be triangulated or whose vertices do not
    /// fit a `u32` index buffer.
    pub fn validate(&self) -> Result<()> {
        let indexable = self
            .width
            .checked_mul(self.height)
            .is_some_and(|count| count <= u32::MAX as usize);

        if self.width < 2
            || self.height < 2
            || !(self.spacing.is_finite() && self.spacing > 0.0)
            || !indexable
        {
            return Err(TerrainError::InvalidGrid {
                width: self.width,
                height: self.height,
                spacing: self.spacing,
            });
        }
        Ok(())
    }

    /// Number of vertices in the grid
    pub fn vertex_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of entries in the triangle index buffer
    pub fn index_count(&self) -> usize {
        self.width.saturating_sub(1) * self.height.saturating_sub(1) * 6
    }

    /// World X coordinate of column `x_idx`. The grid is centred on the origin.
    pub fn x_position(&self, x_idx: usize) -> f64 {
        let width = self.width as f64;
        width * self.spacing as f64 * (x_idx as f64 / (width - 1.0) - 0.5)
    }

    /// World Z coordinate of row `z_idx`.
    pub fn z_position(&self, z_idx: usize) -> f64 {
        let height = self.height as f64;
        height * self.spacing as f64 * (z_idx as f64 / (height - 1.0) - 0.5)
    }
}
