use crate::error::NodeError;
use crate::value::{NodeParams, ParamValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamWidget {
    Default,
    Slider,
    Combo,
}

/// Inclusive bounds of an integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRange {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
    pub widget: ParamWidget,
    pub range: Option<ParamRange>,
    pub step: Option<i32>,
    pub options: Vec<ParamOption>,
    pub default: Option<ParamValue>,
    pub required: bool,
    pub help: Option<&'static str>,
}

impl ParamSpec {
    pub fn new(key: &'static str, label: &'static str, kind: ParamKind) -> Self {
        Self {
            key,
            label,
            kind,
            widget: ParamWidget::Default,
            range: None,
            step: None,
            options: Vec::new(),
            default: None,
            required: true,
            help: None,
        }
    }

    pub fn int_slider(key: &'static str, label: &'static str, min: i32, max: i32) -> Self {
        Self::new(key, label, ParamKind::Int).with_range(ParamRange { min, max }, true)
    }

    pub fn string(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ParamKind::String)
    }

    pub fn string_enum(
        key: &'static str,
        label: &'static str,
        options: Vec<(&'static str, &'static str)>,
    ) -> Self {
        let options = options
            .into_iter()
            .map(|(value, label)| ParamOption { value, label })
            .collect();
        Self::new(key, label, ParamKind::String).with_options(options, true)
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_default(mut self, value: ParamValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_step(mut self, step: i32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_range(mut self, range: ParamRange, slider: bool) -> Self {
        self.range = Some(range);
        if slider {
            self.widget = ParamWidget::Slider;
        }
        self
    }

    pub fn with_options(mut self, options: Vec<ParamOption>, combo: bool) -> Self {
        self.options = options;
        if combo {
            self.widget = ParamWidget::Combo;
        }
        self
    }

    pub fn validate(&self, value: &ParamValue) -> Result<(), NodeError> {
        match (self.kind, value) {
            (ParamKind::Int, ParamValue::Int(v)) => {
                if let Some(ParamRange { min, max }) = self.range {
                    if *v < min || *v > max {
                        return Err(NodeError::invalid_input(format!(
                            "{} must be between {min} and {max}, got {v}",
                            self.key
                        )));
                    }
                }
                Ok(())
            }
            (ParamKind::String, ParamValue::String(v)) => {
                if !self.options.is_empty() && !self.options.iter().any(|opt| opt.value == v) {
                    let allowed: Vec<&str> = self.options.iter().map(|opt| opt.value).collect();
                    return Err(NodeError::invalid_input(format!(
                        "{} must be one of [{}], got {v:?}",
                        self.key,
                        allowed.join(", ")
                    )));
                }
                Ok(())
            }
            (kind, value) => Err(NodeError::invalid_input(format!(
                "{} expects {kind:?}, got {}",
                self.key,
                value.type_name()
            ))),
        }
    }
}

/// Checks every declared parameter. Keys without a spec are left alone.
pub fn validate_params(specs: &[ParamSpec], params: &NodeParams) -> Result<(), NodeError> {
    for spec in specs {
        match params.values.get(spec.key) {
            Some(value) => spec.validate(value)?,
            None if spec.required => {
                return Err(NodeError::invalid_input(format!(
                    "missing required parameter {}",
                    spec.key
                )));
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<ParamSpec> {
        vec![
            ParamSpec::int_slider("batch_size", "Batch Size", 1, 64),
            ParamSpec::int_slider("width", "Width", 64, 8192)
                .with_step(8)
                .optional(),
            ParamSpec::string_enum("format", "Format", vec![("glb", "GLB"), ("obj", "OBJ")]),
        ]
    }

    fn params(values: &[(&str, ParamValue)]) -> NodeParams {
        let mut params = NodeParams::default();
        for (key, value) in values {
            params.set(*key, value.clone());
        }
        params
    }

    #[test]
    fn accepts_values_in_range() {
        let params = params(&[
            ("batch_size", ParamValue::Int(4)),
            ("width", ParamValue::Int(1024)),
            ("format", ParamValue::String("obj".to_string())),
            ("unrelated", ParamValue::Bool(true)),
        ]);
        assert!(validate_params(&specs(), &params).is_ok());
    }

    #[test]
    fn optional_params_may_be_absent() {
        let params = params(&[
            ("batch_size", ParamValue::Int(1)),
            ("format", ParamValue::String("glb".to_string())),
        ]);
        assert!(validate_params(&specs(), &params).is_ok());
    }

    #[test]
    fn rejects_missing_required_param() {
        let params = params(&[("format", ParamValue::String("glb".to_string()))]);
        let err = validate_params(&specs(), &params).unwrap_err();
        assert!(matches!(err, NodeError::InvalidInput(msg) if msg.contains("batch_size")));
    }

    #[test]
    fn rejects_out_of_range_int() {
        let params = params(&[
            ("batch_size", ParamValue::Int(65)),
            ("format", ParamValue::String("glb".to_string())),
        ]);
        assert!(matches!(
            validate_params(&specs(), &params),
            Err(NodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_unknown_option_and_wrong_type() {
        let bad_option = params(&[
            ("batch_size", ParamValue::Int(1)),
            ("format", ParamValue::String("fbx".to_string())),
        ]);
        assert!(validate_params(&specs(), &bad_option).is_err());

        let bad_type = params(&[
            ("batch_size", ParamValue::String("one".to_string())),
            ("format", ParamValue::String("glb".to_string())),
        ]);
        assert!(validate_params(&specs(), &bad_type).is_err());

        let fractional = params(&[
            ("batch_size", ParamValue::Float(1.5)),
            ("format", ParamValue::String("glb".to_string())),
        ]);
        let err = validate_params(&specs(), &fractional).unwrap_err();
        assert!(matches!(err, NodeError::InvalidInput(msg) if msg.contains("got float")));
    }

    #[test]
    fn builders_set_widgets() {
        let spec = ParamSpec::int_slider("width", "Width", 64, 8192).with_step(8);
        assert_eq!(spec.widget, ParamWidget::Slider);
        assert_eq!(spec.step, Some(8));
        let spec = ParamSpec::string_enum("format", "Format", vec![("glb", "GLB")]);
        assert_eq!(spec.widget, ParamWidget::Combo);
    }
}
