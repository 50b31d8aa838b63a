use std::io::Write;

use crate::error::NodeError;
use crate::mesh::Mesh;

/// ASCII PLY with optional per-vertex normals and a triangle face list.
pub fn write_ply<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<(), NodeError> {
    let triangles = mesh.triangles()?;
    let normals = mesh.point_normals();

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Koala PLY export")?;
    writeln!(writer, "element vertex {}", mesh.positions.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if normals.is_some() {
        writeln!(writer, "property float nx")?;
        writeln!(writer, "property float ny")?;
        writeln!(writer, "property float nz")?;
    }
    writeln!(writer, "element face {}", triangles.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (idx, [x, y, z]) in mesh.positions.iter().enumerate() {
        write!(writer, "{x} {y} {z}")?;
        if let Some(normals) = normals {
            let [nx, ny, nz] = normals[idx];
            write!(writer, " {nx} {ny} {nz}")?;
        }
        writeln!(writer)?;
    }
    for [a, b, c] in triangles {
        writeln!(writer, "3 {a} {b} {c}")?;
    }
    Ok(())
}
