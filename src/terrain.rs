//! Procedural terrain: height function, mesh buffers and the synthesizer
//! that regenerates them in the background and morphs between results.

pub mod height;
pub mod mesh;
pub mod morph;
mod system;

pub use height::compute_height;
pub use mesh::{TerrainMesh, TerrainVertex};
pub use morph::MorphState;
pub use system::{GenerationState, TerrainSystem};
