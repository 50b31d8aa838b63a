use std::collections::BTreeMap;
use std::path::{is_separator, Path};

use tracing::info;

use crate::error::NodeError;
use crate::mesh::Mesh;
use crate::mesh_io::{export_mesh, MeshFormat};
use crate::nodes::{pin, require_mesh_input, CATEGORY};
use crate::param_spec::ParamSpec;
use crate::value::{NodeDefinition, NodeParams, NodeValue, ParamValue, PinType};

pub const ID: &str = "SaveMeshAnywhere";
pub const DISPLAY_NAME: &str = "Koala Save 3D Mesh Anywhere";
pub const DEFAULT_SAVE_PATH: &str = "C:/output/model.glb";

pub fn definition() -> NodeDefinition {
    NodeDefinition {
        id: ID.to_string(),
        display_name: DISPLAY_NAME.to_string(),
        category: CATEGORY.to_string(),
        inputs: vec![pin("trimesh", PinType::Mesh)],
        outputs: vec![pin("file_path", PinType::String)],
        output_node: true,
    }
}

pub fn default_params() -> NodeParams {
    NodeParams {
        values: BTreeMap::from([
            (
                "save_path".to_string(),
                ParamValue::String(DEFAULT_SAVE_PATH.to_string()),
            ),
            (
                "file_format".to_string(),
                ParamValue::String(MeshFormat::Glb.extension().to_string()),
            ),
        ]),
    }
}

pub fn param_specs() -> Vec<ParamSpec> {
    let formats = MeshFormat::ALL
        .into_iter()
        .map(|format| (format.extension(), format.label()))
        .collect();
    vec![
        ParamSpec::string("save_path", "Save Path")
            .with_default(ParamValue::String(DEFAULT_SAVE_PATH.to_string()))
            .with_help("Destination file. Missing directories are created."),
        ParamSpec::string_enum("file_format", "File Format", formats)
            .with_default(ParamValue::String(MeshFormat::Glb.extension().to_string()))
            .with_help("Mesh encoding. The file extension is rewritten to match."),
    ]
}

pub fn compute(params: &NodeParams, inputs: &[NodeValue]) -> Result<Vec<NodeValue>, NodeError> {
    let mesh = require_mesh_input(inputs, 0, "Save Mesh Anywhere requires a mesh input")?;
    let save_path = params.get_string("save_path", DEFAULT_SAVE_PATH);
    let format_name = params.get_string("file_format", "glb");
    let format = MeshFormat::from_extension(format_name).ok_or_else(|| {
        NodeError::invalid_input(format!("unsupported mesh format {format_name:?}"))
    })?;
    let path = save_mesh(mesh, save_path, format)?;
    Ok(vec![NodeValue::String(path)])
}

/// Creates missing directories, fixes up the extension, writes the mesh and
/// returns the path actually written.
pub fn save_mesh(mesh: &Mesh, save_path: &str, format: MeshFormat) -> Result<String, NodeError> {
    if save_path.trim().is_empty() {
        return Err(NodeError::invalid_input("Save Mesh Anywhere requires a path"));
    }

    let dir = dirname(save_path);
    if !dir.is_empty() && !Path::new(dir).exists() {
        std::fs::create_dir_all(dir)?;
        info!(dir, "created output directory");
    }

    let path = normalize_save_path(save_path, format);
    export_mesh(mesh, Path::new(&path), format)?;
    Ok(path)
}

/// Keeps `path` when it already ends in `.{ext}` (any case), otherwise swaps
/// or appends the extension.
pub fn normalize_save_path(path: &str, format: MeshFormat) -> String {
    let suffix = format!(".{}", format.extension());
    if path.to_lowercase().ends_with(&suffix) {
        return path.to_string();
    }
    let (stem, _) = split_extension(path);
    format!("{stem}{suffix}")
}

/// Directory part of `path`, trailing separators removed unless the whole
/// head is separators.
fn dirname(path: &str) -> &str {
    let Some(idx) = path.rfind(is_separator) else {
        return "";
    };
    let head = &path[..=idx];
    let trimmed = head.trim_end_matches(is_separator);
    if trimmed.is_empty() {
        head
    } else {
        trimmed
    }
}

/// Splits at the last dot of the final component. Leading dots of the file
/// name do not start an extension.
fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind(is_separator).map(|idx| idx + 1).unwrap_or(0);
    let name = &path[name_start..];
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => {
            let split = name_start + dot;
            (&path[..split], &path[split..])
        }
        _ => (path, ""),
    }
}
