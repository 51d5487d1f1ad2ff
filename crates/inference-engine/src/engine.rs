//! Inference Engine Implementation

use crate::classifier::{ClassProbabilities, Classifier, Diagnosis};
use crate::scaler::FeatureScaler;
use crate::InferenceError;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Allowed deviation of the probability sum from 1
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Prediction for one patient record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = no heart disease, 1 = heart disease
    pub label: u8,
    /// P(class 0)
    pub probability_no_disease: f64,
    /// P(class 1)
    pub probability_disease: f64,
}

impl PredictionResult {
    fn new(label: u8, probabilities: ClassProbabilities) -> Result<Self, InferenceError> {
        let [p0, p1] = probabilities;
        let in_range = |p: f64| (-PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE).contains(&p);
        if !in_range(p0) || !in_range(p1) || ((p0 + p1) - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(InferenceError::InvalidProbabilities(p0, p1));
        }
        if label > 1 {
            return Err(InferenceError::InferenceFailed(format!(
                "classifier returned non-binary label {}",
                label
            )));
        }

        Ok(Self {
            label,
            probability_no_disease: p0.clamp(0.0, 1.0),
            probability_disease: p1.clamp(0.0, 1.0),
        })
    }

    pub fn diagnosis(&self) -> Diagnosis {
        if self.label == 1 {
            Diagnosis::HeartDisease
        } else {
            Diagnosis::NoHeartDisease
        }
    }
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: PredictionResult,
    /// Scale + classify latency in microseconds
    pub latency_us: u64,
}

/// Scales encoded rows and runs the classifier on them.
///
/// Holds the fitted scaler and classifier read-only; one engine is shared by
/// every request.
#[derive(Debug)]
pub struct InferenceEngine {
    scaler: FeatureScaler,
    classifier: Box<dyn Classifier>,
}

impl InferenceEngine {
    /// Create an engine from fitted artifacts
    pub fn new(scaler: FeatureScaler, classifier: Box<dyn Classifier>) -> Self {
        info!(
            "Creating inference engine: scaler={} ({} columns), classifier={} ({} features)",
            scaler.kind(),
            scaler.width(),
            classifier.kind(),
            classifier.n_features()
        );
        Self { scaler, classifier }
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Apply the fitted scaler to an encoded row
    pub fn scale(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        self.scaler.transform(features.values())
    }

    /// Run inference on a feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<InferenceResult, InferenceError> {
        let start = std::time::Instant::now();

        let scaled = self.scale(features)?;
        let (label, probabilities) = self.classifier.classify(&scaled)?;
        let prediction = PredictionResult::new(label, probabilities)?;

        let latency_us = start.elapsed().as_micros() as u64;
        debug!(
            "Prediction: {} (p0={:.4}, p1={:.4}, latency={}us)",
            prediction.diagnosis().as_str(),
            prediction.probability_no_disease,
            prediction.probability_disease,
            latency_us
        );

        Ok(InferenceResult {
            prediction,
            latency_us,
        })
    }
}
