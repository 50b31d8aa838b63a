//! Mesh file writers for the formats the save node offers, plus the
//! loaders the runner uses to feed mesh inputs.

mod dae;
mod glb;
mod obj;
mod ply;
mod stl;
mod threemf;

use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::NodeError;
use crate::mesh::Mesh;

pub use dae::write_dae;
pub use glb::{load_gltf_mesh, write_glb};
pub use obj::{load_obj_mesh, write_obj};
pub use ply::write_ply;
pub use stl::write_stl;
pub use threemf::write_3mf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Glb,
    Obj,
    Ply,
    Stl,
    #[serde(rename = "3mf")]
    ThreeMf,
    Dae,
}

impl MeshFormat {
    /// Selector order shown to users.
    pub const ALL: [MeshFormat; 6] = [
        MeshFormat::Glb,
        MeshFormat::Obj,
        MeshFormat::Ply,
        MeshFormat::Stl,
        MeshFormat::ThreeMf,
        MeshFormat::Dae,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Glb => "glb",
            MeshFormat::Obj => "obj",
            MeshFormat::Ply => "ply",
            MeshFormat::Stl => "stl",
            MeshFormat::ThreeMf => "3mf",
            MeshFormat::Dae => "dae",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MeshFormat::Glb => "GLB",
            MeshFormat::Obj => "OBJ",
            MeshFormat::Ply => "PLY",
            MeshFormat::Stl => "STL",
            MeshFormat::ThreeMf => "3MF",
            MeshFormat::Dae => "DAE",
        }
    }

    /// Exact lookup by the lower-case name offered in the format selector.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == ext)
    }
}

/// Encodes `mesh` in memory. Nothing touches the filesystem, so a mesh that
/// fails validation leaves existing files alone.
pub fn encode_mesh(mesh: &Mesh, format: MeshFormat) -> Result<Vec<u8>, NodeError> {
    let mut cursor = Cursor::new(Vec::new());
    match format {
        MeshFormat::Glb => write_glb(&mut cursor, mesh)?,
        MeshFormat::Obj => write_obj(&mut cursor, mesh)?,
        MeshFormat::Ply => write_ply(&mut cursor, mesh)?,
        MeshFormat::Stl => write_stl(&mut cursor, mesh)?,
        MeshFormat::ThreeMf => write_3mf(&mut cursor, mesh)?,
        MeshFormat::Dae => write_dae(&mut cursor, mesh)?,
    }
    Ok(cursor.into_inner())
}

/// Encodes `mesh` and writes it to `path`, overwriting any existing file
/// only once encoding has succeeded. The parent directory must already
/// exist.
pub fn export_mesh(mesh: &Mesh, path: &Path, format: MeshFormat) -> Result<(), NodeError> {
    let bytes = encode_mesh(mesh, format)?;
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        format = format.extension(),
        vertices = mesh.positions.len(),
        triangles = mesh.triangle_count(),
        bytes = bytes.len(),
        "exported mesh"
    );
    Ok(())
}

/// Loads a mesh by file extension: `.obj`, `.gltf` or `.glb`.
pub fn load_mesh(path: &Path) -> Result<Mesh, NodeError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mesh = match extension.as_str() {
        "obj" => load_obj_mesh(path)?,
        "gltf" | "glb" => load_gltf_mesh(path)?,
        _ => {
            return Err(NodeError::import(
                path.display().to_string(),
                format!("unsupported mesh extension {extension:?}"),
            ))
        }
    };
    info!(
        path = %path.display(),
        vertices = mesh.positions.len(),
        triangles = mesh.triangle_count(),
        "loaded mesh"
    );
    Ok(mesh)
}
