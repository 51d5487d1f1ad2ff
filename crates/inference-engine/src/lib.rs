//! Heart Disease Inference Engine
//!
//! Scales an encoded feature row with the fitted scaler and runs the trained
//! classifier on it. Classifiers sit behind the [`Classifier`] trait: a
//! k-nearest-neighbors model read from JSON, or an ONNX graph run with tract.

mod classifier;
mod engine;
mod knn;
mod onnx;
mod scaler;

pub use classifier::{argmax, ClassProbabilities, Classifier, Diagnosis};
pub use engine::{InferenceEngine, InferenceResult, PredictionResult};
pub use knn::{KnnClassifier, KnnParams, NeighborWeights};
pub use onnx::OnnxClassifier;
pub use scaler::FeatureScaler;

use thiserror::Error;

/// Errors during scaling or inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Scaling failed: scaler expects {expected} features, got {actual}")]
    Scaling { expected: usize, actual: usize },
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Invalid class probabilities: [{0}, {1}]")]
    InvalidProbabilities(f64, f64),
}
