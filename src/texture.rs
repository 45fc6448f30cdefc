//! Height-banded ground texture layers.
//!
//! Layers are decorative: the generator never reads them, a renderer blends
//! them by height. The collection is bounded so it fits a fixed-size
//! uniform block.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Maximum number of texture layers a terrain can carry
pub const MAX_TEXTURE_LAYERS: usize = 8;

/// Stable handle to a layer inside a `TextureLayers` collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A texture source applied over a height band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureLayer {
    /// Texture reference (path or URL), resolved by the renderer
    pub source: String,

    /// Lower edge of the height band
    pub min_height: f32,

    /// Upper edge of the height band
    pub max_height: f32,

    /// World size of one texture tile
    pub tile_size: f32,
}

impl Default for TextureLayer {
    fn default() -> Self {
        Self {
            source: String::new(),
            min_height: 0.0,
            max_height: 1.0,
            tile_size: 1.0,
        }
    }
}

impl TextureLayer {
    pub fn new(source: impl Into<String>, min_height: f32, max_height: f32, tile_size: f32) -> Self {
        Self {
            source: source.into(),
            min_height,
            max_height,
            tile_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_height.is_finite() && self.max_height.is_finite()) {
            return Err(TerrainError::InvalidTextureLayer {
                reason: "height band must be finite".to_string(),
            });
        }
        if self.min_height >= self.max_height {
            return Err(TerrainError::InvalidTextureLayer {
                reason: format!(
                    "min_height {} must be below max_height {}",
                    self.min_height, self.max_height
                ),
            });
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(TerrainError::InvalidTextureLayer {
                reason: format!("tile_size must be > 0, got {}", self.tile_size),
            });
        }
        Ok(())
    }

    /// Gaussian falloff around the band centre: 1 at the centre,
    /// exp(-4) at the band edges.
    pub fn weight_at(&self, height: f32) -> f32 {
        let mid = (self.max_height + self.min_height) * 0.5;
        let half_range = (self.max_height - self.min_height) * 0.5;
        let dist = (height - mid).abs() / half_range;

        (-dist * dist * 4.0).exp()
    }
}

/// Uniform block layout for a shader blending up to `MAX_TEXTURE_LAYERS` layers
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TextureUniforms {
    pub ranges: [[f32; 2]; MAX_TEXTURE_LAYERS],
    pub tile_sizes: [f32; MAX_TEXTURE_LAYERS],
    pub layer_count: u32,
    pub _padding: [u32; 3], // Round up to 16 bytes
}

/// Bounded, ordered collection of texture layers
#[derive(Debug, Clone, Default)]
pub struct TextureLayers {
    layers: Vec<(LayerId, TextureLayer)>,
    next_id: u32,
}

impl TextureLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config, assigning ids in order
    pub fn from_layers(layers: impl IntoIterator<Item = TextureLayer>) -> Result<Self> {
        let mut collection = Self::new();
        for layer in layers {
            collection.add(layer)?;
        }
        Ok(collection)
    }

    pub fn add(&mut self, layer: TextureLayer) -> Result<LayerId> {
        if self.layers.len() >= MAX_TEXTURE_LAYERS {
            return Err(TerrainError::LayerCapacityExceeded {
                max: MAX_TEXTURE_LAYERS,
            });
        }
        layer.validate()?;

        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.push((id, layer));
        Ok(id)
    }

    /// Replace an existing layer in place, keeping its id and position
    pub fn edit(&mut self, id: LayerId, layer: TextureLayer) -> Result<()> {
        layer.validate()?;
        let slot = self
            .layers
            .iter_mut()
            .find(|(layer_id, _)| *layer_id == id)
            .ok_or(TerrainError::LayerNotFound(id))?;
        slot.1 = layer;
        Ok(())
    }

    pub fn remove(&mut self, id: LayerId) -> Result<TextureLayer> {
        let position = self
            .layers
            .iter()
            .position(|(layer_id, _)| *layer_id == id)
            .ok_or(TerrainError::LayerNotFound(id))?;
        Ok(self.layers.remove(position).1)
    }

    pub fn get(&self, id: LayerId) -> Option<&TextureLayer> {
        self.layers
            .iter()
            .find(|(layer_id, _)| *layer_id == id)
            .map(|(_, layer)| layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &TextureLayer)> {
        self.layers.iter().map(|(id, layer)| (*id, layer))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Per-layer blend weights at `height`, normalized to sum to 1.
    ///
    /// Returns an empty vector when no layer contributes; renderers fall back
    /// to a flat base colour in that case.
    pub fn blend_weights(&self, height: f32) -> Vec<(LayerId, f32)> {
        let weights: Vec<(LayerId, f32)> = self
            .iter()
            .map(|(id, layer)| (id, layer.weight_at(height)))
            .collect();
        let total: f32 = weights.iter().map(|(_, w)| w).sum();

        if total > 0.0 {
            weights.into_iter().map(|(id, w)| (id, w / total)).collect()
        } else {
            Vec::new()
        }
    }

    /// Pack the layers into the shader uniform layout.
    /// Unused slots get an empty range and a tile size of 1.
    pub fn uniforms(&self) -> TextureUniforms {
        let mut uniforms = TextureUniforms {
            ranges: [[0.0; 2]; MAX_TEXTURE_LAYERS],
            tile_sizes: [1.0; MAX_TEXTURE_LAYERS],
            layer_count: self.layers.len() as u32,
            _padding: [0; 3],
        };
        for (slot, (_, layer)) in self.layers.iter().enumerate() {
            uniforms.ranges[slot] = [layer.min_height, layer.max_height];
            uniforms.tile_sizes[slot] = layer.tile_size;
        }
        uniforms
    }
}
