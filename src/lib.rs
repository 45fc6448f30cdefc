//! Terrain morph library - seeded procedural terrain with background
//! regeneration and animated height transitions

pub mod cli;
pub mod error;
pub mod export;
pub mod noise;
pub mod params;
pub mod terrain;
pub mod texture;
pub mod worker;

pub use error::{Result, TerrainError};
pub use self::noise::NoiseField;
pub use params::{GridParams, NoiseParams, TerrainConfig};
pub use terrain::{GenerationState, TerrainMesh, TerrainSystem};
pub use texture::{LayerId, TextureLayer, TextureLayers};
