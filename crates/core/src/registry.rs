//! Explicit table of the nodes this crate provides, keyed by the stable
//! identifiers saved in workflows.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::info;

use crate::error::NodeError;
use crate::nodes;
use crate::param_spec::{validate_params, ParamSpec};
use crate::value::{NodeDefinition, NodeParams, NodeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinNodeKind {
    AspectRatioLatent,
    SaveMeshAnywhere,
}

impl BuiltinNodeKind {
    pub const ALL: [BuiltinNodeKind; 2] = [
        BuiltinNodeKind::AspectRatioLatent,
        BuiltinNodeKind::SaveMeshAnywhere,
    ];

    pub fn id(self) -> &'static str {
        match self {
            BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::ID,
            BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::ID,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::DISPLAY_NAME,
            BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::DISPLAY_NAME,
        }
    }
}

pub fn builtin_kind_from_id(id: &str) -> Option<BuiltinNodeKind> {
    match id {
        nodes::aspect_ratio_latent::ID => Some(BuiltinNodeKind::AspectRatioLatent),
        nodes::save_mesh_anywhere::ID => Some(BuiltinNodeKind::SaveMeshAnywhere),
        _ => None,
    }
}

pub fn node_definition(kind: BuiltinNodeKind) -> NodeDefinition {
    match kind {
        BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::definition(),
        BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::definition(),
    }
}

pub fn default_params(kind: BuiltinNodeKind) -> NodeParams {
    match kind {
        BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::default_params(),
        BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::default_params(),
    }
}

pub fn param_specs(kind: BuiltinNodeKind) -> Vec<ParamSpec> {
    match kind {
        BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::param_specs(),
        BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::param_specs(),
    }
}

pub fn compute_node(
    kind: BuiltinNodeKind,
    params: &NodeParams,
    inputs: &[NodeValue],
) -> Result<Vec<NodeValue>, NodeError> {
    match kind {
        BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::compute(params, inputs),
        BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::compute(params, inputs),
    }
}

pub type NodeHandler = fn(&NodeParams, &[NodeValue]) -> Result<Vec<NodeValue>, NodeError>;

#[derive(Debug, Clone)]
pub struct NodeRegistration {
    pub display_name: String,
    pub definition: NodeDefinition,
    pub param_specs: Vec<ParamSpec>,
    pub default_params: NodeParams,
    pub handler: NodeHandler,
}

impl NodeRegistration {
    pub fn builtin(kind: BuiltinNodeKind) -> Self {
        let handler: NodeHandler = match kind {
            BuiltinNodeKind::AspectRatioLatent => nodes::aspect_ratio_latent::compute,
            BuiltinNodeKind::SaveMeshAnywhere => nodes::save_mesh_anywhere::compute,
        };
        Self {
            display_name: kind.display_name().to_string(),
            definition: node_definition(kind),
            param_specs: param_specs(kind),
            default_params: default_params(kind),
            handler,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, NodeRegistration>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry of the builtin nodes, built on first use.
    pub fn builtin() -> &'static NodeRegistry {
        static BUILTIN: OnceLock<NodeRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut registry = NodeRegistry::new();
            for kind in BuiltinNodeKind::ALL {
                registry.register(kind.id(), NodeRegistration::builtin(kind));
            }
            registry
        })
    }

    /// Adds or replaces the node stored under `id`.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        registration: NodeRegistration,
    ) -> Option<NodeRegistration> {
        self.nodes.insert(id.into(), registration)
    }

    pub fn get(&self, id: &str) -> Option<&NodeRegistration> {
        self.nodes.get(id)
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|node| node.display_name.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeRegistration)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validates `params` and the connected inputs against the node schema,
    /// then runs the node.
    pub fn execute(
        &self,
        id: &str,
        params: &NodeParams,
        inputs: &[NodeValue],
    ) -> Result<Vec<NodeValue>, NodeError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| NodeError::UnknownNode(id.to_string()))?;
        validate_params(&node.param_specs, params)?;

        let declared = &node.definition.inputs;
        if inputs.len() > declared.len() {
            return Err(NodeError::invalid_input(format!(
                "{id} takes {} inputs, got {}",
                declared.len(),
                inputs.len()
            )));
        }
        for (index, pin) in declared.iter().enumerate() {
            match inputs.get(index) {
                Some(value) if value.pin_type() != pin.pin_type => {
                    return Err(NodeError::invalid_input(format!(
                        "{id} input {} expects {:?}, got {:?}",
                        pin.name,
                        pin.pin_type,
                        value.pin_type()
                    )));
                }
                None if !pin.optional => {
                    return Err(NodeError::invalid_input(format!(
                        "{id} requires input {}",
                        pin.name
                    )));
                }
                _ => {}
            }
        }

        info!(node = id, display_name = %node.display_name, "executing node");
        (node.handler)(params, inputs)
    }
}
