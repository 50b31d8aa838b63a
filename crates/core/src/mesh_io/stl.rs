use std::io::Write;

use crate::error::NodeError;
use crate::mesh::{face_normal, Mesh};

const HEADER: &[u8] = b"Koala binary STL";

/// Binary STL: 80-byte header, facet count, then 50 bytes per facet.
pub fn write_stl<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<(), NodeError> {
    let triangles = mesh.triangles()?;
    let count = u32::try_from(triangles.len())
        .map_err(|_| NodeError::export("stl", "too many triangles for binary STL"))?;

    let mut header = [0u8; 80];
    header[..HEADER.len()].copy_from_slice(HEADER);
    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;

    let mut facet = Vec::with_capacity(50);
    for tri in triangles {
        let verts = tri.map(|idx| mesh.positions[idx as usize]);
        let normal = face_normal(verts[0], verts[1], verts[2]).normalize_or_zero();

        facet.clear();
        for value in normal.to_array() {
            facet.extend_from_slice(&value.to_le_bytes());
        }
        for vert in verts {
            for value in vert {
                facet.extend_from_slice(&value.to_le_bytes());
            }
        }
        facet.extend_from_slice(&0u16.to_le_bytes());
        writer.write_all(&facet)?;
    }
    Ok(())
}
