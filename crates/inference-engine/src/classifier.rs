//! Classifier Abstraction

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `[P(no disease), P(disease)]`
pub type ClassProbabilities = [f64; 2];

/// Class predicted by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnosis {
    /// Class 0
    NoHeartDisease,
    /// Class 1
    HeartDisease,
}

impl Diagnosis {
    /// Map a class label to a diagnosis
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Diagnosis::NoHeartDisease),
            1 => Some(Diagnosis::HeartDisease),
            _ => None,
        }
    }

    pub fn label(&self) -> u8 {
        match self {
            Diagnosis::NoHeartDisease => 0,
            Diagnosis::HeartDisease => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::NoHeartDisease => "no_heart_disease",
            Diagnosis::HeartDisease => "heart_disease",
        }
    }
}

/// Index of the most probable class; ties go to the lower class
pub fn argmax(probabilities: &ClassProbabilities) -> u8 {
    if probabilities[1] > probabilities[0] {
        1
    } else {
        0
    }
}

/// A trained binary classifier operating on scaled rows.
///
/// Implementations must be deterministic and safe to call from many
/// requests at once.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Short name of the model family
    fn kind(&self) -> &'static str;

    /// Row width the model was trained on
    fn n_features(&self) -> usize;

    /// Class probabilities for one scaled row
    fn predict_proba(&self, row: &[f64]) -> Result<ClassProbabilities, InferenceError>;

    /// Label and probabilities in one pass
    fn classify(&self, row: &[f64]) -> Result<(u8, ClassProbabilities), InferenceError> {
        let probabilities = self.predict_proba(row)?;
        Ok((argmax(&probabilities), probabilities))
    }

    /// Label for one scaled row
    fn predict(&self, row: &[f64]) -> Result<u8, InferenceError> {
        self.classify(row).map(|(label, _)| label)
    }
}
