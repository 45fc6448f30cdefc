//! terrain_morph - generate seeded procedural terrain headlessly
//!
//! Builds a terrain in the background, simulates the height morph for a
//! number of frames, and writes the requested exports.

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use terrain_morph::cli::Args;
use terrain_morph::{Result, TerrainSystem};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.terrain_config()?;
    log::info!(
        "Generating {}x{} terrain (spacing {}, seed {})",
        config.grid.width,
        config.grid.height,
        config.grid.spacing,
        config.random_seed
    );

    let mut terrain = TerrainSystem::new(config)?;
    terrain.finish_generation(args.timeout())?;

    let mut progress = terrain.animation_progress();
    for _ in 0..args.frames {
        progress = terrain.on_frame_update(args.frame_dt);
    }

    if let Some(mesh) = terrain.mesh() {
        let (lowest, highest) = mesh.height_bounds();
        log::info!(
            "Terrain ready: {} vertices, {} triangles, heights {lowest:.2}..{highest:.2}, morph {:.0}%",
            mesh.vertex_count(),
            mesh.triangle_count(),
            progress * 100.0
        );
    }

    if let Some(path) = &args.obj {
        terrain.export_obj(BufWriter::new(File::create(path)?))?;
        log::info!("Wrote mesh to {}", path.display());
    }
    if let Some(path) = &args.heightmap {
        terrain.export_heightmap(path)?;
    }

    Ok(())
}
