//! Fractal height function with river carving.

use crate::noise::NoiseField;
use crate::params::NoiseParams;

/// Terrain height at world position `(x, z)`.
///
/// Sums `octaves` layers of noise, pulls values toward zero where the
/// carving field sits near its midpoint (valleys), normalizes by the total
/// amplitude, scales, and clamps into `[min_height, max_height]`.
///
/// Pure: the result depends only on the arguments, so the interactive
/// thread and a worker compute identical heights from the same seed.
pub fn compute_height(x: f64, z: f64, params: &NoiseParams, field: &NoiseField) -> f64 {
    let mut amplitude = params.start_amplitude;
    let mut frequency = params.start_frequency;
    let mut total_amplitude = 0.0;
    let mut value = 0.0;

    for _ in 0..params.octaves {
        value += field.sample(x * frequency, z * frequency) * amplitude;
        total_amplitude += amplitude;

        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    let river_noise = field.sample(x * params.carve_frequency, z * params.carve_frequency);
    let river = 1.0 - (river_noise * 2.0 - 1.0).abs();
    value *= 1.0 - river * params.carve_amplitude;

    // min/max rather than clamp: NaN collapses into range instead of panicking
    let height = (value / total_amplitude).min(1.0).max(0.0) * params.terrain_scale;

    height.min(params.max_height).max(params.min_height)
}
