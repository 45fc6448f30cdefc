//! Terrain synthesizer: owns the live mesh, dispatches background
//! generation and animates transitions between height fields.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::height::compute_height;
use super::mesh::TerrainMesh;
use super::morph::MorphState;
use crate::error::{Result, TerrainError};
use crate::export;
use crate::noise::NoiseField;
use crate::params::{GridParams, NoiseParams, TerrainConfig};
use crate::texture::{LayerId, TextureLayer, TextureLayers};
use crate::worker::{GenerationRequest, GenerationResponse, JobPoll, JobSlot};

/// Where the synthesizer is in its regeneration cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// Buffers reflect the last completed generation
    Idle,
    /// A background job is in flight
    Generating { job_id: u64 },
}

/// High-level terrain system with background generation and height morphing
pub struct TerrainSystem {
    /// Most recently requested grid
    grid: GridParams,
    noise: NoiseParams,
    /// Interactive-thread copy; workers build their own from the seed
    field: NoiseField,
    mesh: Option<TerrainMesh>,
    morph: MorphState,
    textures: TextureLayers,
    jobs: JobSlot,
    wireframe: bool,
    applied_generations: u64,
}

impl TerrainSystem {
    /// Validate `config` and start generating the initial geometry.
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;

        let mut system = Self {
            grid: config.grid,
            field: NoiseField::new(config.random_seed),
            noise: config.noise,
            mesh: None,
            morph: MorphState::new(config.morph_time),
            textures: TextureLayers::from_layers(config.texture_layers)?,
            jobs: JobSlot::new(),
            wireframe: config.wireframe_enabled,
            applied_generations: 0,
        };

        let grid = system.grid;
        system.regenerate_geometry(grid.width, grid.height, grid.spacing)?;
        Ok(system)
    }

    /// Rebuild the grid at new dimensions in the background.
    ///
    /// Invalid dimensions are rejected before anything is dispatched. Any job
    /// still in flight is cancelled; only the newest request is ever applied.
    pub fn regenerate_geometry(&mut self, width: usize, height: usize, spacing: f32) -> Result<u64> {
        let grid = GridParams::new(width, height, spacing);
        grid.validate()?;

        let id = self.dispatch(grid, self.noise.clone())?;
        self.grid = grid;
        Ok(id)
    }

    /// Swap noise parameters and recompute heights on the current grid.
    ///
    /// With no job in flight the heights are rebuilt synchronously in place.
    /// If a geometry job is pending it is re-dispatched with the new
    /// parameters instead, so its result cannot overwrite them.
    pub fn regenerate_noise(&mut self, noise: NoiseParams) -> Result<()> {
        noise.validate()?;
        if self.mesh.is_none() {
            return Err(TerrainError::MissingGeometry);
        }

        if self.jobs.is_busy() {
            self.dispatch(self.grid, noise.clone())?;
            self.noise = noise;
            self.field.reset_counter();
            return Ok(());
        }

        self.noise = noise;
        self.field.reset_counter();
        let (field, params) = (&self.field, &self.noise);
        if let Some(mesh) = self.mesh.as_mut() {
            mesh.rebuild_heights(|x, z| compute_height(x as f64, z as f64, params, field) as f32);
        }
        self.morph.restart();
        log::debug!("Regenerated terrain noise in place");
        Ok(())
    }

    /// Reseed the noise field. Takes effect on the next regeneration.
    pub fn set_random_seed(&mut self, seed: u32) {
        self.field.reseed(seed);
    }

    /// Per-frame update: pick up a finished job (never blocking), then
    /// advance the morph. Returns the new animation progress.
    pub fn on_frame_update(&mut self, delta_time: f32) -> f32 {
        self.poll_generation();
        self.morph.advance(delta_time)
    }

    /// Apply a finished job if one is ready. Returns true if geometry changed.
    pub fn poll_generation(&mut self) -> bool {
        let outcome = self.jobs.poll();
        self.settle(outcome)
    }

    /// Block for at most `timeout` on the in-flight job, for headless use.
    /// Returns true if geometry changed.
    pub fn wait_for_generation(&mut self, timeout: Duration) -> bool {
        let outcome = self.jobs.wait(timeout);
        self.settle(outcome)
    }

    /// Block until the in-flight job is applied.
    ///
    /// Fails with `GenerationTimeout` if it is still running after `timeout`,
    /// and with `MissingGeometry` if no geometry exists afterwards.
    pub fn finish_generation(&mut self, timeout: Duration) -> Result<()> {
        if self.jobs.is_busy() {
            self.wait_for_generation(timeout);
            if self.jobs.is_busy() {
                return Err(TerrainError::GenerationTimeout(timeout));
            }
        }
        if self.mesh.is_none() {
            return Err(TerrainError::MissingGeometry);
        }
        Ok(())
    }

    /// Start a job for `grid` and `noise`. Callers commit either only once
    /// this succeeds.
    fn dispatch(&mut self, grid: GridParams, noise: NoiseParams) -> Result<u64> {
        let prior_positions = self
            .mesh
            .as_ref()
            .map(|mesh| mesh.positions.clone())
            .unwrap_or_default();

        self.jobs.dispatch(GenerationRequest {
            grid,
            noise,
            random_seed: self.field.seed(),
            prior_positions,
        })
    }

    fn settle(&mut self, outcome: JobPoll) -> bool {
        match outcome {
            JobPoll::Ready(response) => {
                self.apply(response);
                true
            }
            // Last good geometry stays; the caller may retry
            JobPoll::Lost | JobPoll::Pending => false,
        }
    }

    fn apply(&mut self, response: GenerationResponse) {
        let GenerationResponse {
            job_id,
            grid,
            prior_heights,
            positions,
            indices,
        } = response;

        let mesh = TerrainMesh::from_buffers(grid, prior_heights, positions, indices);
        log::info!(
            "Applied generation {job_id}: {}x{} grid, {} triangles",
            grid.width,
            grid.height,
            mesh.triangle_count()
        );

        self.mesh = Some(mesh);
        self.morph.restart();
        self.applied_generations += 1;
    }

    pub fn state(&self) -> GenerationState {
        match self.jobs.pending_id() {
            Some(job_id) => GenerationState::Generating { job_id },
            None => GenerationState::Idle,
        }
    }

    pub fn mesh(&self) -> Option<&TerrainMesh> {
        self.mesh.as_ref()
    }

    pub fn grid(&self) -> &GridParams {
        &self.grid
    }

    pub fn noise_params(&self) -> &NoiseParams {
        &self.noise
    }

    pub fn random_seed(&self) -> u32 {
        self.field.seed()
    }

    pub fn animation_progress(&self) -> f32 {
        self.morph.progress()
    }

    /// Number of background generations applied so far
    pub fn applied_generations(&self) -> u64 {
        self.applied_generations
    }

    /// Scene placement of the mesh: centred on the height range
    pub fn vertical_offset(&self) -> f32 {
        (-0.5 * self.noise.height_range()) as f32
    }

    /// Heights shown this frame, interpolated between prior and current
    pub fn animated_heights(&self) -> Vec<f32> {
        let Some(mesh) = &self.mesh else {
            return Vec::new();
        };
        mesh.prior_heights
            .iter()
            .zip(mesh.heights())
            .map(|(&prior, current)| self.morph.interpolate(prior, current))
            .collect()
    }

    /// Interleaved positions with animated heights, ready for upload
    pub fn animated_positions(&self) -> Vec<f32> {
        let Some(mesh) = &self.mesh else {
            return Vec::new();
        };
        let mut positions = mesh.positions.clone();
        for (position, &prior) in positions.chunks_exact_mut(3).zip(&mesh.prior_heights) {
            position[1] = self.morph.interpolate(prior, position[1]);
        }
        positions
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    /// Flip wireframe display, returning the new mode
    pub fn toggle_wireframe(&mut self) -> bool {
        self.wireframe = !self.wireframe;
        self.wireframe
    }

    pub fn textures(&self) -> &TextureLayers {
        &self.textures
    }

    pub fn add_texture_layer(&mut self, layer: TextureLayer) -> Result<LayerId> {
        self.textures.add(layer)
    }

    pub fn edit_texture_layer(&mut self, id: LayerId, layer: TextureLayer) -> Result<()> {
        self.textures.edit(id, layer)
    }

    pub fn remove_texture_layer(&mut self, id: LayerId) -> Result<TextureLayer> {
        self.textures.remove(id)
    }

    /// Write the current mesh as OBJ
    pub fn export_obj(&self, writer: impl Write) -> Result<()> {
        let mesh = self.mesh.as_ref().ok_or(TerrainError::MissingGeometry)?;
        export::write_obj(mesh, self.vertical_offset(), writer)
    }

    /// Write the current heights as a grayscale PNG
    pub fn export_heightmap(&self, path: impl AsRef<Path>) -> Result<()> {
        let mesh = self.mesh.as_ref().ok_or(TerrainError::MissingGeometry)?;
        export::write_heightmap_png(
            mesh,
            self.noise.min_height as f32,
            self.noise.max_height as f32,
            path,
        )
    }
}
