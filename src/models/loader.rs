//! ONNX model loader

use crate::schema::ModelSchema;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use std::path::Path;
use tracing::{info, warn};

/// Element kind of a graph input, used to pick the tensor type fed to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Float32,
    Float64,
    Int64,
}

impl InputKind {
    fn from_value_type(value_type: &ValueType) -> Self {
        match value_type {
            ValueType::Tensor { ty, .. } => match ty {
                TensorElementType::String => InputKind::Text,
                TensorElementType::Float64 => InputKind::Float64,
                TensorElementType::Int64 => InputKind::Int64,
                _ => InputKind::Float32,
            },
            _ => InputKind::Float32,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, InputKind::Text)
    }
}

/// A named graph input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
}

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// One entry per graph input, in graph order
    pub inputs: Vec<InputSpec>,
    /// Output carrying the predicted class index
    pub label_output: Option<String>,
    /// Output carrying class probabilities
    pub probability_output: Option<String>,
    /// Columns the model expects
    pub schema: ModelSchema,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the exported pipeline, taking its schema from `schema_path` when given
    /// and from the graph inputs otherwise.
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        schema_path: Option<&Path>,
    ) -> Result<LoadedModel> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let inputs: Vec<InputSpec> = session
            .inputs
            .iter()
            .map(|input| InputSpec {
                name: input.name.clone(),
                kind: InputKind::from_value_type(&input.input_type),
            })
            .collect();

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let label_output = output_names.iter().find(|n| n.contains("label")).cloned();
        let probability_output = output_names
            .iter()
            .find(|n| n.contains("prob"))
            .cloned()
            .or_else(|| {
                output_names
                    .iter()
                    .find(|n| Some(*n) != label_output.as_ref())
                    .cloned()
            });

        let schema = match schema_path {
            Some(schema_path) => {
                let schema = ModelSchema::from_json_file(schema_path)?;
                check_schema_against_inputs(&schema, &inputs);
                schema
            }
            None => schema_from_inputs(&inputs),
        };

        info!(
            model = %name,
            inputs = inputs.len(),
            numeric = schema.numeric.len(),
            categorical = schema.categorical.len(),
            label_output = ?label_output,
            probability_output = ?probability_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            inputs,
            label_output,
            probability_output,
            schema,
        })
    }
}

/// String inputs feed the categorical encoder, everything else the numeric transformer.
pub fn schema_from_inputs(inputs: &[InputSpec]) -> ModelSchema {
    let (categorical, numeric): (Vec<&InputSpec>, Vec<&InputSpec>) =
        inputs.iter().partition(|input| input.kind.is_text());

    ModelSchema::new(
        numeric.into_iter().map(|i| i.name.clone()).collect(),
        categorical.into_iter().map(|i| i.name.clone()).collect(),
    )
}

fn check_schema_against_inputs(schema: &ModelSchema, inputs: &[InputSpec]) {
    let expected = schema.expected_columns();
    for input in inputs {
        if !expected.contains(&input.name) {
            warn!(input = %input.name, "Graph input not listed in schema file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, kind: InputKind) -> InputSpec {
        InputSpec {
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn test_schema_from_inputs() {
        let inputs = vec![
            spec("State", InputKind::Text),
            spec("Approved Cost", InputKind::Float32),
            spec("Sector", InputKind::Text),
            spec("Delay_Flag", InputKind::Int64),
            spec("SDR", InputKind::Float64),
        ];

        let schema = schema_from_inputs(&inputs);
        assert_eq!(schema.numeric, vec!["Approved Cost", "Delay_Flag", "SDR"]);
        assert_eq!(schema.categorical, vec!["State", "Sector"]);
    }

    #[test]
    fn test_input_kind_text() {
        assert!(InputKind::Text.is_text());
        assert!(!InputKind::Float64.is_text());
    }
}
