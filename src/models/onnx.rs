//! ONNX Runtime classifier backend

use crate::error::{ChurnError, Result};
use crate::models::classifier::Classifier;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier exported to ONNX (e.g. scikit-learn via skl2onnx)
pub struct OnnxClassifier {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output name for probabilities
    output_name: String,
    /// Feature count from the input shape, when the model fixes it
    input_width: Option<usize>,
}

fn build_session(path: &Path, onnx_threads: usize) -> anyhow::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(onnx_threads)?
        .commit_from_file(path)?;
    Ok(session)
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = build_session(path, onnx_threads).map_err(|e| ChurnError::ModelLoad {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        })?;

        let input = session.inputs.first().ok_or_else(|| ChurnError::ModelLoad {
            path: path.to_path_buf(),
            reason: "model declares no inputs".to_string(),
        })?;
        let input_name = input.name.clone();
        let input_width = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape
                .last()
                .copied()
                .filter(|&dim| dim > 0)
                .map(|dim| dim as usize),
            _ => None,
        };

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| ChurnError::ModelLoad {
                path: path.to_path_buf(),
                reason: "model declares no outputs".to_string(),
            })?;

        info!(
            input = %input_name,
            output = %output_name,
            width = ?input_width,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_width,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor = Tensor::from_array((shape, row))
            .map_err(|e| ChurnError::Inference(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ChurnError::Inference(format!("Lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| ChurnError::Inference(e.to_string()))?;

        extract_probability(&outputs, &self.output_name)
    }
}

/// Extract the churn-class probability from model output.
///
/// Handles a probability tensor and the seq(map(int64, float)) layout that
/// ZipMap-style exports produce.
fn extract_probability(outputs: &SessionOutputs, output_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = extract_from_value(output)? {
            return Ok(prob);
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Some(prob) = extract_from_value(&output)? {
            debug!(output = %name, prob = prob, "Extracted probability from fallback output");
            return Ok(prob);
        }
    }

    Err(ChurnError::Inference(
        "model produced no probability output".to_string(),
    ))
}

fn extract_from_value(output: &ort::value::DynValue) -> Result<Option<f64>> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return positive_class_from_tensor(&dims, data).map(Some);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return positive_class_from_sequence_map(output).map(Some);
    }

    Ok(None)
}

/// [batch, classes] or [classes]; class 1 is churn. A single column is
/// already the positive-class probability.
fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    let index = match classes {
        2.. => 1,
        1 => 0,
        _ => {
            return Err(ChurnError::Inference(format!(
                "unexpected probability tensor shape {:?}",
                dims
            )))
        }
    };

    data.get(index)
        .map(|&p| p as f64)
        .ok_or_else(|| ChurnError::Inference("probability tensor is empty".to_string()))
}

fn positive_class_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| ChurnError::Inference(format!("Failed to downcast to sequence: {}", e)))?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| ChurnError::Inference(e.to_string()))?;

    // batch size is always 1
    let first = maps
        .first()
        .ok_or_else(|| ChurnError::Inference("Empty sequence".to_string()))?;

    let kv_pairs = first
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| ChurnError::Inference(e.to_string()))?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(ChurnError::Inference(
        "No class probability found in map".to_string(),
    ))
}
