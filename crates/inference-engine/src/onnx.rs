//! ONNX Classifier backed by tract

use crate::classifier::{argmax, ClassProbabilities, Classifier};
use crate::InferenceError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Classifier exported to ONNX (e.g. skl2onnx with `zipmap=False`).
///
/// The graph takes one `[1, n_features]` f32 input and produces an int64
/// label output and a `[1, 2]` f32 probability output. When the label
/// output is missing the label is the most probable class.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    model_path: PathBuf,
    n_features: usize,
}

impl OnnxClassifier {
    /// Load and optimize an ONNX model for rows of `n_features` columns
    pub fn load(path: impl AsRef<Path>, n_features: usize) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX classifier from {}", path.display());

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, n_features]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
            })?;

        info!("ONNX classifier ready: {} features", n_features);

        Ok(Self {
            plan,
            model_path: path.to_path_buf(),
            n_features,
        })
    }

    fn run(&self, row: &[f64]) -> Result<TVec<TValue>, InferenceError> {
        if row.len() != self.n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_shape(&[1, self.n_features], &data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        self.plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))
    }
}

/// First f32 output with exactly two values
fn probability_output(outputs: &[TValue]) -> Option<ClassProbabilities> {
    outputs.iter().find_map(|output| {
        let view = output.to_array_view::<f32>().ok()?;
        let values: Vec<f32> = view.iter().copied().collect();
        match values.as_slice() {
            [p0, p1] => Some([*p0 as f64, *p1 as f64]),
            _ => None,
        }
    })
}

/// First int64 output holding a single value
fn label_output(outputs: &[TValue]) -> Option<i64> {
    outputs.iter().find_map(|output| {
        let view = output.to_array_view::<i64>().ok()?;
        if view.len() == 1 {
            view.iter().next().copied()
        } else {
            None
        }
    })
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, row: &[f64]) -> Result<ClassProbabilities, InferenceError> {
        self.classify(row).map(|(_, probabilities)| probabilities)
    }

    fn classify(&self, row: &[f64]) -> Result<(u8, ClassProbabilities), InferenceError> {
        let outputs = self.run(row)?;

        let probabilities = probability_output(&outputs).ok_or_else(|| {
            InferenceError::InferenceFailed(
                "model has no two-class f32 probability output".to_string(),
            )
        })?;

        let label = match label_output(&outputs) {
            Some(0) => 0,
            Some(1) => 1,
            Some(other) => {
                return Err(InferenceError::InferenceFailed(format!(
                    "model returned non-binary label {}",
                    other
                )))
            }
            None => {
                debug!("ONNX model has no label output, using argmax");
                argmax(&probabilities)
            }
        };

        Ok((label, probabilities))
    }
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("model_path", &self.model_path)
            .field("n_features", &self.n_features)
            .finish()
    }
}
