pub mod aspect_ratio_latent;
pub mod save_mesh_anywhere;

use crate::error::NodeError;
use crate::tensor::ImageTensor;
use crate::mesh::Mesh;
use crate::value::{NodeValue, PinDefinition, PinType};

pub const CATEGORY: &str = "Koala";

pub fn pin(name: &str, pin_type: PinType) -> PinDefinition {
    PinDefinition {
        name: name.to_string(),
        pin_type,
        optional: false,
    }
}

pub fn optional_pin(name: &str, pin_type: PinType) -> PinDefinition {
    PinDefinition {
        optional: true,
        ..pin(name, pin_type)
    }
}

pub fn require_mesh_input<'a>(
    inputs: &'a [NodeValue],
    index: usize,
    message: &str,
) -> Result<&'a Mesh, NodeError> {
    inputs
        .get(index)
        .and_then(NodeValue::as_mesh)
        .ok_or_else(|| NodeError::invalid_input(message))
}

pub fn optional_image_input(
    inputs: &[NodeValue],
    index: usize,
) -> Result<Option<&ImageTensor>, NodeError> {
    match inputs.get(index) {
        None => Ok(None),
        Some(NodeValue::Image(image)) => Ok(Some(image)),
        Some(other) => Err(NodeError::invalid_input(format!(
            "expected an image input, got {:?}",
            other.pin_type()
        ))),
    }
}
