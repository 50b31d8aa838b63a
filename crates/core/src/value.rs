use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::tensor::{ImageTensor, Latent};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NodeParams {
    pub values: BTreeMap<String, ParamValue>,
}

impl NodeParams {
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.int(key).unwrap_or(default)
    }

    pub fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.string(key).unwrap_or(default)
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        self.values.get(key).and_then(|value| match value {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        })
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|value| match value {
            ParamValue::String(v) => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::String(_) => "string",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinType {
    Image,
    Latent,
    Mesh,
    Int,
    Float,
    String,
}

#[derive(Debug, Clone)]
pub struct PinDefinition {
    pub name: String,
    pub pin_type: PinType,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub inputs: Vec<PinDefinition>,
    pub outputs: Vec<PinDefinition>,
    pub output_node: bool,
}

/// A value travelling along a link between nodes.
#[derive(Debug, Clone)]
pub enum NodeValue {
    Image(ImageTensor),
    Latent(Latent),
    Mesh(Mesh),
    Int(i64),
    Float(f64),
    String(String),
}

impl NodeValue {
    pub fn pin_type(&self) -> PinType {
        match self {
            NodeValue::Image(_) => PinType::Image,
            NodeValue::Latent(_) => PinType::Latent,
            NodeValue::Mesh(_) => PinType::Mesh,
            NodeValue::Int(_) => PinType::Int,
            NodeValue::Float(_) => PinType::Float,
            NodeValue::String(_) => PinType::String,
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            NodeValue::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_lookups_distinguish_absent_values() {
        let mut params = NodeParams::default();
        assert_eq!(params.int("width"), None);
        assert_eq!(params.get_int("width", 1024), 1024);
        params.set("width", ParamValue::Int(640));
        assert_eq!(params.int("width"), Some(640));
        params.set("width", ParamValue::String("640".to_string()));
        assert_eq!(params.int("width"), None);
    }

    #[test]
    fn params_deserialize_from_plain_json() {
        let params: NodeParams = serde_json::from_str(
            r#"{"values": {"width": 1920, "save_path": "out.glb", "scale": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(params.int("width"), Some(1920));
        assert_eq!(params.string("save_path"), Some("out.glb"));
        assert_eq!(params.values.get("scale"), Some(&ParamValue::Float(0.5)));
    }

    #[test]
    fn values_report_their_pin_type() {
        let value = NodeValue::Image(ImageTensor::new(1, 8, 8, 3));
        assert_eq!(value.pin_type(), PinType::Image);
        assert!(value.as_mesh().is_none());
        let mesh = NodeValue::Mesh(Mesh::new());
        assert_eq!(mesh.pin_type(), PinType::Mesh);
        assert!(mesh.as_mesh().is_some());
    }
}
