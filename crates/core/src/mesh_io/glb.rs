use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use crate::error::NodeError;
use crate::mesh::Mesh;

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

pub fn load_gltf_mesh(path: &Path) -> Result<Mesh, NodeError> {
    let (document, buffers, _) =
        gltf::import(path).map_err(|err| NodeError::import(path.display().to_string(), err))?;
    build_mesh_from_gltf(&document, &buffers)
        .map_err(|message| NodeError::import(path.display().to_string(), message))
}

fn build_mesh_from_gltf(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<Mesh, String> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut include_normals = true;
    let mut include_uvs = true;

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let prim_positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| "glTF primitive missing POSITION attribute".to_string())?
                .collect();
            if prim_positions.is_empty() {
                continue;
            }
            let base = positions.len() as u32;
            positions.extend(prim_positions.iter().copied());

            if let Some(iter) = reader.read_normals() {
                normals.extend(iter);
            } else {
                include_normals = false;
            }

            if let Some(iter) = reader.read_tex_coords(0) {
                uvs.extend(iter.into_f32());
            } else {
                include_uvs = false;
            }

            let prim_indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..prim_positions.len() as u32).collect(),
            };
            indices.extend(prim_indices.into_iter().map(|idx| idx + base));
        }
    }

    if positions.is_empty() {
        return Err("glTF has no triangle geometry".to_string());
    }

    let mut mesh = Mesh::with_positions_indices(positions, indices);
    if include_normals && normals.len() == mesh.positions.len() {
        mesh.normals = Some(normals);
    }
    if include_uvs && uvs.len() == mesh.positions.len() {
        mesh.uvs = Some(uvs);
    }
    if mesh.normals.is_none() {
        mesh.compute_normals();
    }
    Ok(mesh)
}

/// Writes a single-primitive glTF 2.0 binary.
pub fn write_glb<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<(), NodeError> {
    let (json, bin) = build_gltf_payload(mesh)?;
    let json_bytes = serde_json::to_vec(&json).map_err(|err| NodeError::export("glb", err))?;
    let glb = gltf::binary::Glb {
        header: gltf::binary::Header {
            magic: *b"glTF",
            version: 2,
            length: 0,
        },
        json: Cow::Owned(json_bytes),
        bin: Some(Cow::Owned(bin)),
    };
    glb.to_writer(writer)
        .map_err(|err| NodeError::export("glb", err))
}

fn build_gltf_payload(mesh: &Mesh) -> Result<(serde_json::Value, Vec<u8>), NodeError> {
    let triangles = mesh.triangles()?;
    let indices: Vec<u32> = triangles.into_iter().flatten().collect();

    let mut buffer = Vec::new();
    let mut buffer_views = Vec::new();
    let mut accessors = Vec::new();
    let mut attributes = serde_json::Map::new();

    let pos_view = push_f32(&mut buffer, &mut buffer_views, mesh.positions.as_flattened(), ARRAY_BUFFER);
    let (pos_min, pos_max) = min_max_vec3(&mesh.positions);
    let pos_accessor = push_accessor(
        &mut accessors,
        pos_view,
        FLOAT,
        mesh.positions.len(),
        "VEC3",
        Some((pos_min, pos_max)),
    );
    attributes.insert("POSITION".to_string(), serde_json::json!(pos_accessor));

    if let Some(normals) = mesh.point_normals() {
        let view = push_f32(&mut buffer, &mut buffer_views, normals.as_flattened(), ARRAY_BUFFER);
        let accessor = push_accessor(&mut accessors, view, FLOAT, normals.len(), "VEC3", None);
        attributes.insert("NORMAL".to_string(), serde_json::json!(accessor));
    }
    if let Some(uvs) = mesh.point_uvs() {
        let view = push_f32(&mut buffer, &mut buffer_views, uvs.as_flattened(), ARRAY_BUFFER);
        let accessor = push_accessor(&mut accessors, view, FLOAT, uvs.len(), "VEC2", None);
        attributes.insert("TEXCOORD_0".to_string(), serde_json::json!(accessor));
    }

    let (index_bytes, index_component_type) = encode_indices(&indices, mesh.positions.len());
    let index_view = push_bytes(
        &mut buffer,
        &mut buffer_views,
        &index_bytes,
        ELEMENT_ARRAY_BUFFER,
    );
    let index_accessor = push_accessor(
        &mut accessors,
        index_view,
        index_component_type,
        indices.len(),
        "SCALAR",
        None,
    );
    align_to_four(&mut buffer);

    let gltf = serde_json::json!({
        "asset": {
            "version": "2.0",
            "generator": "Koala"
        },
        "scenes": [
            { "nodes": [0] }
        ],
        "scene": 0,
        "nodes": [
            { "mesh": 0 }
        ],
        "meshes": [
            {
                "primitives": [
                    {
                        "attributes": attributes,
                        "indices": index_accessor,
                        "mode": 4
                    }
                ]
            }
        ],
        "buffers": [
            { "byteLength": buffer.len() }
        ],
        "bufferViews": buffer_views,
        "accessors": accessors
    });

    Ok((gltf, buffer))
}

fn push_f32(
    buffer: &mut Vec<u8>,
    buffer_views: &mut Vec<serde_json::Value>,
    data: &[f32],
    target: u32,
) -> usize {
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    push_bytes(buffer, buffer_views, &bytes, target)
}

fn push_bytes(
    buffer: &mut Vec<u8>,
    buffer_views: &mut Vec<serde_json::Value>,
    data: &[u8],
    target: u32,
) -> usize {
    align_to_four(buffer);
    let offset = buffer.len();
    buffer.extend_from_slice(data);
    buffer_views.push(serde_json::json!({
        "buffer": 0,
        "byteOffset": offset,
        "byteLength": data.len(),
        "target": target
    }));
    buffer_views.len() - 1
}

fn push_accessor(
    accessors: &mut Vec<serde_json::Value>,
    view: usize,
    component_type: u32,
    count: usize,
    ty: &str,
    bounds: Option<([f32; 3], [f32; 3])>,
) -> usize {
    let mut obj = serde_json::Map::new();
    obj.insert("bufferView".to_string(), serde_json::json!(view));
    obj.insert("componentType".to_string(), serde_json::json!(component_type));
    obj.insert("count".to_string(), serde_json::json!(count));
    obj.insert("type".to_string(), serde_json::json!(ty));
    if let Some((min, max)) = bounds {
        obj.insert("min".to_string(), serde_json::json!(min));
        obj.insert("max".to_string(), serde_json::json!(max));
    }
    accessors.push(serde_json::Value::Object(obj));
    accessors.len() - 1
}

fn encode_indices(indices: &[u32], vertex_count: usize) -> (Vec<u8>, u32) {
    if vertex_count <= u16::MAX as usize {
        let mut bytes = Vec::with_capacity(indices.len() * 2);
        for &idx in indices {
            bytes.extend_from_slice(&(idx as u16).to_le_bytes());
        }
        (bytes, UNSIGNED_SHORT)
    } else {
        let mut bytes = Vec::with_capacity(indices.len() * 4);
        for &idx in indices {
            bytes.extend_from_slice(&idx.to_le_bytes());
        }
        (bytes, UNSIGNED_INT)
    }
}

fn min_max_vec3(data: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for value in data {
        for i in 0..3 {
            min[i] = min[i].min(value[i]);
            max[i] = max[i].max(value[i]);
        }
    }
    (min, max)
}

fn align_to_four(buffer: &mut Vec<u8>) {
    let padding = (4 - (buffer.len() % 4)) % 4;
    buffer.extend(std::iter::repeat_n(0u8, padding));
}
