//! Model contract and risk inference

use crate::error::{ModelError, PredictError};
use crate::models::loader::{InputKind, InputSpec, LoadedModel, ModelLoader};
use crate::schema::ModelSchema;
use crate::types::features::{FeatureRow, FeatureValue};
use crate::types::prediction::RiskLabel;
use anyhow::Result;
use ort::value::{DynValue, Tensor};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// A trained classifier that can score one feature row.
pub trait RiskModel: Send + Sync {
    /// Columns the model's preprocessing stage expects
    fn schema(&self) -> &ModelSchema;

    /// Predict the class index for a single reconciled row
    fn predict(&self, row: &FeatureRow) -> Result<i64, ModelError>;
}

/// Run `row` through `model` and map the class index to a label.
///
/// Class indices outside the trained label set become [`RiskLabel::Unknown`].
pub fn infer(row: &FeatureRow, model: &dyn RiskModel) -> Result<RiskLabel, PredictError> {
    let class = model.predict(row)?;
    let label = RiskLabel::from_class(class);

    if label == RiskLabel::Unknown {
        warn!(class = class, "Model returned an unmapped class index");
    } else {
        debug!(class = class, label = %label, "Inference complete");
    }

    Ok(label)
}

/// ONNX Runtime backed risk model.
pub struct OnnxRiskModel {
    /// `Session::run` needs exclusive access, so predictions are serialized
    model: Mutex<LoadedModel>,
    inputs: Vec<InputSpec>,
    schema: ModelSchema,
    name: String,
}

impl OnnxRiskModel {
    /// Load the model (and optional schema sidecar) from disk
    pub fn load(model_path: &Path, schema_path: Option<&Path>, onnx_threads: usize) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let loaded = loader.load_model(model_path, schema_path)?;
        Ok(Self::from_loaded(loaded))
    }

    pub fn from_loaded(loaded: LoadedModel) -> Self {
        Self {
            inputs: loaded.inputs.clone(),
            schema: loaded.schema.clone(),
            name: loaded.name.clone(),
            model: Mutex::new(loaded),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn build_inputs(&self, row: &FeatureRow) -> Result<Vec<(String, DynValue)>, ModelError> {
        let shape = vec![1_i64, 1];
        let mut values = Vec::with_capacity(self.inputs.len());

        for input in &self.inputs {
            let value = row
                .get(&input.name)
                .ok_or_else(|| ModelError::MissingColumn(input.name.clone()))?;

            let tensor = match input.kind {
                InputKind::Text => {
                    let text = text_for_input(&input.name, value)?;
                    Tensor::<String>::from_string_array((shape.clone(), &[text][..]))?.into_dyn()
                }
                InputKind::Float32 => {
                    let n = number_for_input(&input.name, value)?;
                    Tensor::from_array((shape.clone(), vec![n as f32]))?.into_dyn()
                }
                InputKind::Float64 => {
                    let n = number_for_input(&input.name, value)?;
                    Tensor::from_array((shape.clone(), vec![n]))?.into_dyn()
                }
                InputKind::Int64 => {
                    let n = number_for_input(&input.name, value)?;
                    Tensor::from_array((shape.clone(), vec![n.round() as i64]))?.into_dyn()
                }
            };

            values.push((input.name.clone(), tensor));
        }

        Ok(values)
    }
}

impl RiskModel for OnnxRiskModel {
    fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    fn predict(&self, row: &FeatureRow) -> Result<i64, ModelError> {
        let inputs = self.build_inputs(row)?;

        let mut model = lock_recovering(&self.model);
        let label_output = model.label_output.clone();
        let probability_output = model.probability_output.clone();

        let outputs = model.session.run(inputs)?;

        // Classifier exports carry the class directly as an int64 label tensor
        if let Some(name) = label_output.as_deref() {
            if let Some(output) = outputs.get(name) {
                if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                    if let Some(&class) = data.first() {
                        return Ok(class);
                    }
                }
            }
        }

        // Fall back to the most probable class of a [1, n_classes] tensor
        if let Some(name) = probability_output.as_deref() {
            if let Some(output) = outputs.get(name) {
                if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                    if let Some(class) = argmax(data) {
                        debug!(output = %name, "Class taken from probability tensor");
                        return Ok(class as i64);
                    }
                }
            }
        }

        Err(ModelError::NoClassOutput)
    }
}

fn text_for_input(column: &str, value: &FeatureValue) -> Result<String, ModelError> {
    match value {
        // Zero-filled categorical columns arrive as numbers
        FeatureValue::Number(n) if n.fract() == 0.0 => Ok(format!("{}", *n as i64)),
        FeatureValue::Number(n) => Ok(n.to_string()),
        other => other.as_text().ok_or_else(|| ModelError::ColumnType {
            column: column.to_string(),
            expected: "string",
        }),
    }
}

fn number_for_input(column: &str, value: &FeatureValue) -> Result<f64, ModelError> {
    value.as_f64().ok_or_else(|| ModelError::ColumnType {
        column: column.to_string(),
        expected: "numeric",
    })
}

fn argmax(data: &[f32]) -> Option<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, p)| !p.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

/// Take the lock even if a previous holder panicked. The session keeps no
/// state that a panicked call could leave half-updated.
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Model lock was poisoned by a panicked prediction, recovering");
        poisoned.into_inner()
    })
}
