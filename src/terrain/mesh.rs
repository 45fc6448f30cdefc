//! Height-field mesh buffers and grid triangulation.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::params::GridParams;

/// Interleaved vertex layout for GPU upload
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Height before the latest regeneration (morph start)
    pub prior_height: f32,
}

/// Terrain geometry owned by the synthesizer
///
/// Vertices are laid out column-major over the grid: vertex `x * height + z`
/// sits at grid column `x`, row `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    grid: GridParams,
    /// One entry per vertex
    pub prior_heights: Vec<f32>,
    /// Interleaved x/y/z, y is the current height
    pub positions: Vec<f32>,
    /// Two triangles per grid cell
    pub indices: Vec<u32>,
    /// Interleaved unit normals, one per vertex
    pub normals: Vec<f32>,
}

impl TerrainMesh {
    /// Wrap freshly generated buffers and compute normals.
    pub fn from_buffers(
        grid: GridParams,
        prior_heights: Vec<f32>,
        positions: Vec<f32>,
        indices: Vec<u32>,
    ) -> Self {
        let normals = compute_vertex_normals(&positions, &indices);
        Self {
            grid,
            prior_heights,
            positions,
            indices,
            normals,
        }
    }

    pub fn grid(&self) -> &GridParams {
        &self.grid
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Current height of vertex `idx`
    pub fn height(&self, idx: usize) -> f32 {
        self.positions[idx * 3 + 1]
    }

    pub fn heights(&self) -> impl Iterator<Item = f32> + '_ {
        self.positions.chunks_exact(3).map(|p| p[1])
    }

    /// Lowest and highest current heights
    pub fn height_bounds(&self) -> (f32, f32) {
        self.heights()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| {
                (lo.min(h), hi.max(h))
            })
    }

    /// Overwrite every height via `height_fn(x, z)`, saving the old heights
    /// as prior heights, then refresh normals.
    pub fn rebuild_heights(&mut self, mut height_fn: impl FnMut(f32, f32) -> f32) {
        for (prior, position) in self
            .prior_heights
            .iter_mut()
            .zip(self.positions.chunks_exact_mut(3))
        {
            *prior = position[1];
            position[1] = height_fn(position[0], position[2]);
        }
        self.recompute_normals();
    }

    pub fn recompute_normals(&mut self) {
        self.normals = compute_vertex_normals(&self.positions, &self.indices);
    }

    /// Interleave positions, normals and prior heights for upload.
    pub fn vertices(&self) -> Vec<TerrainVertex> {
        self.positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .zip(&self.prior_heights)
            .map(|((position, normal), &prior_height)| TerrainVertex {
                position: [position[0], position[1], position[2]],
                normal: [normal[0], normal[1], normal[2]],
                prior_height,
            })
            .collect()
    }
}

/// Triangle indices for a `width x height` grid.
///
/// Each cell emits `(tl, tr, bl)` and `(tr, br, bl)`; this winding is what
/// the normal computation and lighting expect.
pub fn triangulate_grid(width: usize, height: usize) -> Vec<u32> {
    triangulate_grid_until(width, height, || true).unwrap_or_default()
}

/// `triangulate_grid` that polls `keep_going` once per cell and returns
/// `None` as soon as it reports false.
pub fn triangulate_grid_until(
    width: usize,
    height: usize,
    mut keep_going: impl FnMut() -> bool,
) -> Option<Vec<u32>> {
    let mut indices =
        Vec::with_capacity(width.saturating_sub(1) * height.saturating_sub(1) * 6);

    for x_idx in 0..width.saturating_sub(1) {
        let x_offset = x_idx * height;
        let x_offset_next = (x_idx + 1) * height;

        for z_idx in 0..height.saturating_sub(1) {
            if !keep_going() {
                return None;
            }
            let tl = (x_offset + z_idx) as u32;
            let bl = (x_offset_next + z_idx) as u32;
            let tr = tl + 1;
            let br = bl + 1;

            indices.extend_from_slice(&[tl, tr, bl, tr, br, bl]);
        }
    }

    Some(indices)
}

/// Vertices copied between cancellation checks in `capture_prior_heights_until`
const CAPTURE_CHECK_STRIDE: usize = 4096;

/// Heights to morph from after a regeneration.
///
/// Takes the y component of each previous vertex by flat index, truncating
/// or zero-padding to `vertex_count`.
pub fn capture_prior_heights(prior_positions: &[f32], vertex_count: usize) -> Vec<f32> {
    capture_prior_heights_until(prior_positions, vertex_count, || true).unwrap_or_default()
}

/// `capture_prior_heights` that polls `keep_going` every few thousand
/// vertices and returns `None` as soon as it reports false.
pub fn capture_prior_heights_until(
    prior_positions: &[f32],
    vertex_count: usize,
    mut keep_going: impl FnMut() -> bool,
) -> Option<Vec<f32>> {
    let mut prior_heights = Vec::with_capacity(vertex_count);

    let vertices = prior_positions.chunks_exact(3).take(vertex_count);
    for (idx, position) in vertices.enumerate() {
        if idx % CAPTURE_CHECK_STRIDE == 0 && !keep_going() {
            return None;
        }
        prior_heights.push(position[1]);
    }

    if !keep_going() {
        return None;
    }
    prior_heights.resize(vertex_count, 0.0);
    Some(prior_heights)
}

/// Area-weighted vertex normals.
///
/// Face normals `(c - b) x (a - b)` are summed into each corner and
/// normalized; vertices touched by no triangle keep a zero normal.
pub fn compute_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex = |idx: u32| {
        let base = idx as usize * 3;
        Vec3::new(positions[base], positions[base + 1], positions[base + 2])
    };

    let mut accumulated = vec![Vec3::ZERO; positions.len() / 3];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
        let face = (c - b).cross(a - b);

        for &idx in tri {
            accumulated[idx as usize] += face;
        }
    }

    accumulated
        .into_iter()
        .flat_map(|n| n.normalize_or_zero().to_array())
        .collect()
}

/// Build the full mesh buffers for `grid` with `height_fn(x, z)`.
///
/// Returns `None` as soon as `keep_going` reports false; it is polled
/// before every sample.
pub fn build_positions(
    grid: &GridParams,
    mut height_fn: impl FnMut(f64, f64) -> f64,
    mut keep_going: impl FnMut() -> bool,
) -> Option<Vec<f32>> {
    let mut positions = Vec::with_capacity(grid.vertex_count() * 3);

    for x_idx in 0..grid.width {
        let x_position = grid.x_position(x_idx);

        for z_idx in 0..grid.height {
            if !keep_going() {
                return None;
            }
            let z_position = grid.z_position(z_idx);

            positions.push(x_position as f32);
            positions.push(height_fn(x_position, z_position) as f32);
            positions.push(z_position as f32);
        }
    }

    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangulation_topology() {
        for (width, height) in [(2, 2), (3, 5), (7, 4)] {
            let indices = triangulate_grid(width, height);

            assert_eq!(indices.len(), (width - 1) * (height - 1) * 6);
            assert!(indices.iter().all(|&i| (i as usize) < width * height));
        }
    }

    #[test]
    fn test_triangulation_winding() {
        let (width, height) = (3, 4);
        let indices = triangulate_grid(width, height);

        let mut cell = 0;
        for x in 0..width - 1 {
            for z in 0..height - 1 {
                let tl = (x * height + z) as u32;
                let bl = ((x + 1) * height + z) as u32;
                let (tr, br) = (tl + 1, bl + 1);

                assert_eq!(&indices[cell * 6..cell * 6 + 6], &[tl, tr, bl, tr, br, bl]);
                cell += 1;
            }
        }
    }

    #[test]
    fn test_prior_heights_zero_padded() {
        // 3x3 grid with heights 1..=9
        let prior: Vec<f32> = (0..9)
            .flat_map(|i| [i as f32, (i + 1) as f32, -(i as f32)])
            .collect();
        let heights = capture_prior_heights(&prior, 25);

        assert_eq!(heights.len(), 25);
        assert_eq!(&heights[..9], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert!(heights[9..].iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_prior_heights_truncated() {
        let prior: Vec<f32> = (0..25).flat_map(|i| [0.0, i as f32, 0.0]).collect();
        let heights = capture_prior_heights(&prior, 4);
        assert_eq!(heights, vec![0.0, 1.0, 2.0, 3.0]);

        assert_eq!(capture_prior_heights(&[], 3), vec![0.0; 3]);
    }

    #[test]
    fn test_flat_grid_normals_point_up() {
        let grid = GridParams::new(4, 4, 1.0);
        let positions = build_positions(&grid, |_, _| 2.0, || true).unwrap();
        let indices = triangulate_grid(grid.width, grid.height);
        let normals = compute_vertex_normals(&positions, &indices);

        for normal in normals.chunks_exact(3) {
            assert!((normal[0]).abs() < 1e-6);
            assert!((normal[1] - 1.0).abs() < 1e-6, "normal {:?}", normal);
            assert!((normal[2]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sloped_grid_normals_lean_downhill() {
        // Height rises with x, so normals tilt toward -x
        let grid = GridParams::new(3, 3, 1.0);
        let positions = build_positions(&grid, |x, _| x, || true).unwrap();
        let indices = triangulate_grid(grid.width, grid.height);
        let normals = compute_vertex_normals(&positions, &indices);

        for normal in normals.chunks_exact(3) {
            assert!(normal[0] < 0.0);
            assert!(normal[1] > 0.0);
        }
    }

    #[test]
    fn test_build_positions_stops_inside_a_column() {
        // One column is far longer than the point where we stop
        let grid = GridParams::new(2, 10_000, 1.0);
        let mut checks = 0;
        let mut samples = 0;
        let result = build_positions(
            &grid,
            |_, _| {
                samples += 1;
                0.0
            },
            || {
                checks += 1;
                checks <= 3
            },
        );
        assert!(result.is_none());
        assert_eq!(checks, 4);
        assert_eq!(samples, 3);
    }

    #[test]
    fn test_triangulation_stops_inside_a_column() {
        let mut checks = 0;
        let result = triangulate_grid_until(2, 100_000, || {
            checks += 1;
            checks <= 5
        });
        assert!(result.is_none());
        assert_eq!(checks, 6);

        assert_eq!(
            triangulate_grid_until(3, 4, || true).unwrap(),
            triangulate_grid(3, 4)
        );
    }

    #[test]
    fn test_prior_capture_can_stop_early() {
        let prior = vec![1.0; 3 * 20_000];
        let mut checks = 0;
        let result = capture_prior_heights_until(&prior, 20_000, || {
            checks += 1;
            checks <= 2
        });
        assert!(result.is_none());
        assert_eq!(checks, 3);

        assert!(capture_prior_heights_until(&prior, 10, || false).is_none());
    }

    #[test]
    fn test_rebuild_heights_saves_prior() {
        let grid = GridParams::new(2, 3, 1.0);
        let positions = build_positions(&grid, |_, _| 5.0, || true).unwrap();
        let mut mesh = TerrainMesh::from_buffers(
            grid,
            vec![0.0; 6],
            positions,
            triangulate_grid(2, 3),
        );

        mesh.rebuild_heights(|x, _| x);

        assert!(mesh.prior_heights.iter().all(|&h| h == 5.0));
        assert_eq!(mesh.height(0), -1.0);
        assert_eq!(mesh.height_bounds(), (-1.0, 1.0));
    }

    #[test]
    fn test_vertex_packing() {
        let grid = GridParams::new(2, 2, 1.0);
        let positions = build_positions(&grid, |_, _| 1.0, || true).unwrap();
        let mesh = TerrainMesh::from_buffers(grid, vec![0.5; 4], positions, triangulate_grid(2, 2));

        let vertices = mesh.vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].position, [1.0, 1.0, 1.0]);
        assert_eq!(vertices[3].prior_height, 0.5);

        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 4 * std::mem::size_of::<TerrainVertex>());
        assert_eq!(std::mem::size_of::<TerrainVertex>(), 28);
    }
}
