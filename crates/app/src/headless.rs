use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use koala_core::{
    load_mesh, make_box, ImageTensor, Mesh, NodeParams, NodeRegistry, NodeValue, ParamValue,
    PinDefinition, PinType,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct HeadlessPlan {
    #[serde(default)]
    pub(crate) steps: Vec<PlanStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanStep {
    pub(crate) node: String,
    #[serde(default)]
    pub(crate) params: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub(crate) image: Option<PathBuf>,
    #[serde(default)]
    pub(crate) mesh: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StepReport {
    pub(crate) node: String,
    pub(crate) display_name: String,
    pub(crate) outputs: BTreeMap<String, Value>,
}

pub(crate) fn load_headless_plan(path: &Path) -> Result<HeadlessPlan, String> {
    let data = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
    serde_json::from_slice(&data).map_err(|err| format!("{}: {err}", path.display()))
}

pub(crate) fn run_plan(
    registry: &NodeRegistry,
    plan: &HeadlessPlan,
) -> Result<Vec<StepReport>, String> {
    let mut reports = Vec::with_capacity(plan.steps.len());
    for (index, step) in plan.steps.iter().enumerate() {
        let report = run_step(registry, step).map_err(|err| format!("step {index}: {err}"))?;
        tracing::info!("headless: step {index} ({}) done", step.node);
        reports.push(report);
    }
    tracing::info!("headless: completed {} steps", reports.len());
    Ok(reports)
}

pub(crate) fn run_step(registry: &NodeRegistry, step: &PlanStep) -> Result<StepReport, String> {
    let node = registry
        .get(&step.node)
        .ok_or_else(|| format!("unknown node {}", step.node))?;

    let mut params = node.default_params.clone();
    for (key, value) in &step.params {
        params.set(key.clone(), value.clone());
    }
    let inputs = build_inputs(&node.definition.inputs, step)?;
    let outputs = registry
        .execute(&step.node, &params, &inputs)
        .map_err(|err| err.to_string())?;

    let reports = node
        .definition
        .outputs
        .iter()
        .zip(&outputs)
        .map(|(pin, value)| (pin.name.clone(), describe_value(value)))
        .collect();
    Ok(StepReport {
        node: step.node.clone(),
        display_name: node.display_name.clone(),
        outputs: reports,
    })
}

/// Resolves the step's file references into positional node inputs. A mesh
/// pin without a file gets a unit box.
fn build_inputs(pins: &[PinDefinition], step: &PlanStep) -> Result<Vec<NodeValue>, String> {
    let mut inputs = Vec::new();
    for pin in pins {
        let value = match pin.pin_type {
            PinType::Image => match &step.image {
                Some(path) => NodeValue::Image(load_image_tensor(path)?),
                None => break,
            },
            PinType::Mesh => NodeValue::Mesh(load_mesh_or_default(step.mesh.as_deref())?),
            _ => break,
        };
        inputs.push(value);
    }
    Ok(inputs)
}

/// Probes the image header for its size; pixel data is never decoded.
pub(crate) fn load_image_tensor(path: &Path) -> Result<ImageTensor, String> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|err| format!("failed to read image {}: {err}", path.display()))?;
    tracing::debug!("headless: image {} is {width}x{height}", path.display());
    Ok(ImageTensor::new(1, height as usize, width as usize, 3))
}

pub(crate) fn load_mesh_or_default(path: Option<&Path>) -> Result<Mesh, String> {
    match path {
        Some(path) => load_mesh(path).map_err(|err| err.to_string()),
        None => {
            tracing::info!("headless: no mesh given, using a unit box");
            Ok(make_box([1.0, 1.0, 1.0]))
        }
    }
}

pub(crate) fn describe_value(value: &NodeValue) -> Value {
    match value {
        NodeValue::Image(image) => json!({ "image": image.shape }),
        NodeValue::Latent(latent) => json!({ "latent": latent.samples.shape() }),
        NodeValue::Mesh(mesh) => json!({
            "points": mesh.positions.len(),
            "triangles": mesh.triangle_count(),
        }),
        NodeValue::Int(value) => json!(value),
        NodeValue::Float(value) => json!(value),
        NodeValue::String(value) => json!(value),
    }
}

pub(crate) fn params_from_pairs<I>(pairs: I) -> NodeParams
where
    I: IntoIterator<Item = (&'static str, Option<ParamValue>)>,
{
    let mut params = NodeParams::default();
    for (key, value) in pairs {
        if let Some(value) = value {
            params.set(key, value);
        }
    }
    params
}

pub(crate) fn print_reports(reports: &[StepReport], as_json: bool) -> Result<(), String> {
    if as_json {
        let json = serde_json::to_string_pretty(reports).map_err(|err| err.to_string())?;
        println!("{json}");
        return Ok(());
    }
    for report in reports {
        println!("{} ({})", report.display_name, report.node);
        for (name, value) in &report.outputs {
            match value {
                Value::String(text) => println!("  {name}: {text}"),
                other => println!("  {name}: {other}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_from_json(text: &str) -> HeadlessPlan {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn plan_parses_steps_with_optional_files() {
        let plan = plan_from_json(
            r#"{
                "steps": [
                    { "node": "AspectRatioLatentNode", "params": { "width": 1920, "height": 1080 } },
                    { "node": "SaveMeshAnywhere", "mesh": "in.obj",
                      "params": { "save_path": "out/model", "file_format": "ply" } }
                ]
            }"#,
        );
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].params.get("width"), Some(&ParamValue::Int(1920)));
        assert!(plan.steps[0].image.is_none());
        assert_eq!(plan.steps[1].mesh.as_deref(), Some(Path::new("in.obj")));
        assert_eq!(
            plan.steps[1].params.get("file_format"),
            Some(&ParamValue::String("ply".to_string()))
        );
    }

    #[test]
    fn latent_step_reports_every_output() {
        let plan = plan_from_json(
            r#"{ "steps": [ { "node": "AspectRatioLatentNode",
                 "params": { "batch_size": 2, "width": 1920, "height": 1088 } } ] }"#,
        );
        let reports = run_plan(NodeRegistry::builtin(), &plan).unwrap();
        let outputs = &reports[0].outputs;
        assert_eq!(reports[0].display_name, "Koala Aspect Ratio Empty Latent");
        assert_eq!(outputs["latent"], json!({ "latent": [2, 4, 96, 168] }));
        assert_eq!(outputs["width"], json!(1344));
        assert_eq!(outputs["height"], json!(768));
        assert_eq!(outputs.len(), 5);
    }

    #[test]
    fn image_dimensions_drive_the_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        image::RgbImage::new(96, 64).save(&path).unwrap();

        let tensor = load_image_tensor(&path).unwrap();
        assert_eq!(tensor.shape, [1, 64, 96, 3]);

        let step = PlanStep {
            node: "AspectRatioLatentNode".to_string(),
            params: BTreeMap::new(),
            image: Some(path),
            mesh: None,
        };
        let report = run_step(NodeRegistry::builtin(), &step).unwrap();
        assert_eq!(report.outputs["width"], json!(1216));
        assert_eq!(report.outputs["height"], json!(832));
    }

    #[test]
    fn save_step_writes_default_box() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("box.glb");
        let step = PlanStep {
            node: "SaveMeshAnywhere".to_string(),
            params: BTreeMap::from([
                (
                    "save_path".to_string(),
                    ParamValue::String(target.to_str().unwrap().to_string()),
                ),
                ("file_format".to_string(), ParamValue::String("obj".to_string())),
            ]),
            image: None,
            mesh: None,
        };
        let report = run_step(NodeRegistry::builtin(), &step).unwrap();
        let Value::String(written) = &report.outputs["file_path"] else {
            panic!("unexpected report {report:?}");
        };
        assert!(written.ends_with("box.obj"));
        assert!(Path::new(written).is_file());
    }

    #[test]
    fn failing_step_is_numbered() {
        let plan = plan_from_json(r#"{ "steps": [ { "node": "Nope" } ] }"#);
        let err = run_plan(NodeRegistry::builtin(), &plan).unwrap_err();
        assert_eq!(err, "step 0: unknown node Nope");
    }

    #[test]
    fn params_from_pairs_skips_missing_values() {
        let params = params_from_pairs([
            ("width", Some(ParamValue::Int(640))),
            ("height", None),
        ]);
        assert_eq!(params.int("width"), Some(640));
        assert_eq!(params.int("height"), None);
    }
}
