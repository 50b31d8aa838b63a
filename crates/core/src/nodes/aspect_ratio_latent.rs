use std::collections::BTreeMap;

use crate::aspect_ratio::match_aspect_ratio;
use crate::error::NodeError;
use crate::nodes::{optional_image_input, optional_pin, pin, CATEGORY};
use crate::param_spec::ParamSpec;
use crate::value::{NodeDefinition, NodeParams, NodeValue, ParamValue, PinType};

pub const ID: &str = "AspectRatioLatentNode";
pub const DISPLAY_NAME: &str = "Koala Aspect Ratio Empty Latent";

pub fn definition() -> NodeDefinition {
    NodeDefinition {
        id: ID.to_string(),
        display_name: DISPLAY_NAME.to_string(),
        category: CATEGORY.to_string(),
        inputs: vec![optional_pin("image", PinType::Image)],
        outputs: vec![
            pin("latent", PinType::Latent),
            pin("width", PinType::Int),
            pin("height", PinType::Int),
            pin("aspect_ratio", PinType::Float),
            pin("info", PinType::String),
        ],
        output_node: false,
    }
}

pub fn default_params() -> NodeParams {
    NodeParams {
        values: BTreeMap::from([
            ("batch_size".to_string(), ParamValue::Int(1)),
            ("width".to_string(), ParamValue::Int(1024)),
            ("height".to_string(), ParamValue::Int(1024)),
        ]),
    }
}

pub fn param_specs() -> Vec<ParamSpec> {
    vec![
        ParamSpec::int_slider("batch_size", "Batch Size", 1, 64)
            .with_default(ParamValue::Int(1))
            .with_help("Number of latents in the batch."),
        ParamSpec::int_slider("width", "Width", 64, 8192)
            .with_step(8)
            .with_default(ParamValue::Int(1024))
            .optional()
            .with_help("Target width when no image is connected."),
        ParamSpec::int_slider("height", "Height", 64, 8192)
            .with_step(8)
            .with_default(ParamValue::Int(1024))
            .optional()
            .with_help("Target height when no image is connected."),
    ]
}

pub fn compute(params: &NodeParams, inputs: &[NodeValue]) -> Result<Vec<NodeValue>, NodeError> {
    let batch_size = params.get_int("batch_size", 1);
    let batch_size = usize::try_from(batch_size)
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| NodeError::invalid_input(format!("batch_size must be positive, got {batch_size}")))?;
    let image = optional_image_input(inputs, 0)?;

    let result = match_aspect_ratio(batch_size, image, params.int("width"), params.int("height"))?;
    Ok(vec![
        NodeValue::Latent(result.latent),
        NodeValue::Int(result.matched.width as i64),
        NodeValue::Int(result.matched.height as i64),
        NodeValue::Float(result.matched.ratio),
        NodeValue::String(result.info),
    ])
}
