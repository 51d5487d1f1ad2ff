//! Fitted Feature Scalers

use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Per-column transform fitted on the training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// Z-score: `(x - mean) / scale`
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        /// Column names seen during fitting, if recorded
        feature_names: Option<Vec<String>>,
    },
    /// Min-max: `x * scale + min`
    MinMax {
        min: Vec<f64>,
        scale: Vec<f64>,
        feature_names: Option<Vec<String>>,
    },
}

impl FeatureScaler {
    /// Z-score scaler without recorded feature names
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        FeatureScaler::Standard {
            mean,
            scale,
            feature_names: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureScaler::Standard { .. } => "standard",
            FeatureScaler::MinMax { .. } => "min_max",
        }
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        match self {
            FeatureScaler::Standard { scale, .. } | FeatureScaler::MinMax { scale, .. } => scale.len(),
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            FeatureScaler::Standard { feature_names, .. }
            | FeatureScaler::MinMax { feature_names, .. } => feature_names.as_deref(),
        }
    }

    /// Check the fitted parameters are usable
    pub fn validate(&self) -> Result<(), InferenceError> {
        let (offset, scale) = match self {
            FeatureScaler::Standard { mean, scale, .. } => (mean, scale),
            FeatureScaler::MinMax { min, scale, .. } => (min, scale),
        };

        if offset.len() != scale.len() {
            return Err(InferenceError::ModelLoadError(format!(
                "{} scaler has {} offsets but {} scales",
                self.kind(),
                offset.len(),
                scale.len()
            )));
        }
        if let Some(names) = self.feature_names() {
            if names.len() != scale.len() {
                return Err(InferenceError::ModelLoadError(format!(
                    "{} scaler names {} features but has {} scales",
                    self.kind(),
                    names.len(),
                    scale.len()
                )));
            }
        }
        if offset.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(InferenceError::ModelLoadError(format!(
                "{} scaler has non-finite parameters",
                self.kind()
            )));
        }
        if let FeatureScaler::Standard { scale, .. } = self {
            if let Some(i) = scale.iter().position(|s| *s == 0.0) {
                return Err(InferenceError::ModelLoadError(format!(
                    "standard scaler has zero scale at column {}",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Apply the fitted transform to one row
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if row.len() != self.width() {
            return Err(InferenceError::Scaling {
                expected: self.width(),
                actual: row.len(),
            });
        }

        let scaled = match self {
            FeatureScaler::Standard { mean, scale, .. } => row
                .iter()
                .zip(mean)
                .zip(scale)
                .map(|((x, m), s)| (x - m) / s)
                .collect(),
            FeatureScaler::MinMax { min, scale, .. } => row
                .iter()
                .zip(min)
                .zip(scale)
                .map(|((x, m), s)| x * s + m)
                .collect(),
        };
        Ok(scaled)
    }
}
