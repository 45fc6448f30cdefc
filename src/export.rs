//! Mesh and heightmap export.

use std::io::Write;
use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::Result;
use crate::terrain::TerrainMesh;

/// Object name written into OBJ files
pub const OBJ_OBJECT_NAME: &str = "Terrain";

/// Write `mesh` as a Wavefront OBJ object.
///
/// Vertices are shifted by `y_offset` (the mesh's placement in the scene);
/// faces reference positions and normals with 1-based indices and keep the
/// grid's triangle winding.
pub fn write_obj(mesh: &TerrainMesh, y_offset: f32, mut writer: impl Write) -> Result<()> {
    writeln!(writer, "o {OBJ_OBJECT_NAME}")?;

    for position in mesh.positions.chunks_exact(3) {
        writeln!(writer, "v {} {} {}", position[0], position[1] + y_offset, position[2])?;
    }

    for normal in mesh.normals.chunks_exact(3) {
        writeln!(writer, "vn {} {} {}", normal[0], normal[1], normal[2])?;
    }

    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }

    writer.flush()?;
    Ok(())
}

/// Render current heights to an 8-bit grayscale PNG.
///
/// Pixel `(x, z)` is grid column `x`, row `z`; heights map linearly from
/// `[min_height, max_height]` to `[0, 255]`.
pub fn write_heightmap_png(
    mesh: &TerrainMesh,
    min_height: f32,
    max_height: f32,
    path: impl AsRef<Path>,
) -> Result<()> {
    let grid = mesh.grid();
    let range = max_height - min_height;

    let mut img = GrayImage::new(grid.width as u32, grid.height as u32);
    for x_idx in 0..grid.width {
        for z_idx in 0..grid.height {
            let height = mesh.height(x_idx * grid.height + z_idx);
            let normalized = if range > 0.0 {
                (height - min_height) / range
            } else {
                0.0
            };
            let gray = (normalized * 255.0).round().clamp(0.0, 255.0) as u8;

            img.put_pixel(x_idx as u32, z_idx as u32, Luma([gray]));
        }
    }

    img.save(path.as_ref())?;
    log::info!("Wrote heightmap to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GridParams;
    use crate::terrain::mesh::{build_positions, triangulate_grid};

    fn ramp_mesh() -> TerrainMesh {
        // Heights 0, 1, 2, ... along the flat vertex order
        let grid = GridParams::new(3, 2, 1.0);
        let mut next = 0.0;
        let positions = build_positions(
            &grid,
            |_, _| {
                let h = next;
                next += 1.0;
                h
            },
            || true,
        )
        .unwrap();
        TerrainMesh::from_buffers(grid, vec![0.0; 6], positions, triangulate_grid(3, 2))
    }

    #[test]
    fn test_obj_layout() {
        let mesh = ramp_mesh();
        let mut out = Vec::new();
        write_obj(&mesh, -2.0, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "o Terrain");
        assert_eq!(lines.iter().filter(|l| l.starts_with("v ")).count(), 6);
        assert_eq!(lines.iter().filter(|l| l.starts_with("vn ")).count(), 6);
        assert_eq!(lines.iter().filter(|l| l.starts_with("f ")).count(), 4);

        // First vertex: x = -1.5, height 0 shifted by -2, z = -1
        assert_eq!(lines[1], "v -1.5 -2 -1");
        // First face is (tl, tr, bl) = (0, 1, 2) in 1-based form
        let first_face = lines.iter().find(|l| l.starts_with("f ")).unwrap();
        assert_eq!(*first_face, "f 1//1 2//2 3//3");
    }

    #[test]
    fn test_heightmap_png() {
        let mesh = ramp_mesh();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heightmap.png");

        write_heightmap_png(&mesh, 0.0, 5.0, &path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(2, 1)[0], 255);
        // Vertex 1 is column 0, row 1 at height 1 of 5
        assert_eq!(img.get_pixel(0, 1)[0], 51);
    }
}
