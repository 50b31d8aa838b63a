mod aspect_ratio;
mod error;
mod mesh;
mod mesh_io;
mod nodes;
mod param_spec;
mod registry;
mod tensor;
mod value;

pub use aspect_ratio::{
    build_result, closest_entry, find_closest_aspect_ratio, match_aspect_ratio,
    resolve_input_dimensions, AspectRatioEntry, AspectRatioMatch, ASPECT_RATIOS,
};
pub use error::NodeError;
pub use mesh::{face_normal, make_box, Aabb, Mesh};
pub use mesh_io::{
    encode_mesh, export_mesh, load_gltf_mesh, load_mesh, load_obj_mesh, write_3mf, write_dae,
    write_glb, write_obj, write_ply, write_stl, MeshFormat,
};
pub use nodes::save_mesh_anywhere::{normalize_save_path, save_mesh};
pub use nodes::{aspect_ratio_latent, save_mesh_anywhere, CATEGORY};
pub use param_spec::{
    validate_params, ParamKind, ParamOption, ParamRange, ParamSpec, ParamWidget,
};
pub use registry::{
    builtin_kind_from_id, compute_node, default_params, node_definition, param_specs,
    BuiltinNodeKind, NodeHandler, NodeRegistration, NodeRegistry,
};
pub use tensor::{ImageTensor, Latent, Tensor, LATENT_CHANNELS, LATENT_DOWNSCALE};
pub use value::{
    NodeDefinition, NodeParams, NodeValue, ParamValue, PinDefinition, PinType,
};
