use std::io::Write;
use std::path::Path;

use crate::error::NodeError;
use crate::mesh::Mesh;

pub fn write_obj<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<(), NodeError> {
    let triangles = mesh.triangles()?;
    let uvs = mesh.point_uvs();
    let normals = mesh.point_normals();

    writeln!(writer, "# Koala OBJ export")?;
    for p in &mesh.positions {
        writeln!(writer, "v {} {} {}", p[0], p[1], p[2])?;
    }
    if let Some(uvs) = uvs {
        for uv in uvs {
            writeln!(writer, "vt {} {}", uv[0], uv[1])?;
        }
    }
    if let Some(normals) = normals {
        for n in normals {
            writeln!(writer, "vn {} {} {}", n[0], n[1], n[2])?;
        }
    }

    for tri in triangles {
        let [a, b, c] = tri.map(|idx| idx + 1);
        match (uvs.is_some(), normals.is_some()) {
            (true, true) => writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?,
            (true, false) => writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?,
            (false, true) => writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?,
            (false, false) => writeln!(writer, "f {a} {b} {c}")?,
        }
    }
    Ok(())
}

pub fn load_obj_mesh(path: &Path) -> Result<Mesh, NodeError> {
    if !path.exists() {
        return Err(NodeError::import(
            path.display().to_string(),
            "file not found",
        ));
    }
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _) = tobj::load_obj(path, &options)
        .map_err(|err| NodeError::import(path.display().to_string(), err))?;
    build_mesh_from_models(models)
        .map_err(|message| NodeError::import(path.display().to_string(), message))
}

fn build_mesh_from_models(models: Vec<tobj::Model>) -> Result<Mesh, String> {
    if models.is_empty() {
        return Err("OBJ has no geometry".to_string());
    }

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut include_normals = true;
    let mut include_uvs = true;
    let mut vertex_offset = 0u32;

    for model in models {
        let mesh = &model.mesh;
        if mesh.positions.len() % 3 != 0 {
            return Err("OBJ has malformed positions".to_string());
        }
        let vertex_count = mesh.positions.len() / 3;

        positions.extend(mesh.positions.chunks_exact(3).map(|v| [v[0], v[1], v[2]]));
        indices.extend(mesh.indices.iter().map(|i| i + vertex_offset));
        vertex_offset += vertex_count as u32;

        if mesh.normals.len() == mesh.positions.len() {
            normals.extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        } else {
            include_normals = false;
        }

        if mesh.texcoords.len() / 2 == vertex_count {
            uvs.extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
        } else {
            include_uvs = false;
        }
    }

    let mut mesh = Mesh::with_positions_indices(positions, indices);
    if include_normals && !normals.is_empty() {
        mesh.normals = Some(normals);
    }
    if include_uvs && !uvs.is_empty() {
        mesh.uvs = Some(uvs);
    }
    if mesh.normals.is_none() {
        mesh.compute_normals();
    }
    Ok(mesh)
}
