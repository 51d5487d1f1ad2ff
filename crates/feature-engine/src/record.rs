//! Patient Record

use crate::error::EncodeError;
use serde::{Deserialize, Serialize};

/// Biological sex as recorded in the training data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Category label used in column names
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

/// Exercise-induced angina
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseAngina {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

impl ExerciseAngina {
    /// Category label used in column names
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseAngina::Yes => "Y",
            ExerciseAngina::No => "N",
        }
    }
}

/// One heart-health record as submitted for prediction.
///
/// Field names on the wire match the column names of the training data.
/// The multi-valued categorical fields stay plain strings so that an unknown
/// category can be reported back with the exact value the caller sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    /// Age in years
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Sex")]
    pub sex: Sex,
    /// TA, ATA, NAP or ASY
    #[serde(rename = "ChestPainType")]
    pub chest_pain_type: String,
    /// Resting blood pressure (mmHg)
    #[serde(rename = "RestingBP")]
    pub resting_bp: i64,
    /// Serum cholesterol (mg/dl)
    #[serde(rename = "Cholesterol")]
    pub cholesterol: i64,
    /// 1 if fasting blood sugar > 120 mg/dl
    #[serde(rename = "FastingBS")]
    pub fasting_bs: i64,
    /// Normal, ST or LVH
    #[serde(rename = "RestingECG")]
    pub resting_ecg: String,
    /// Maximum heart rate achieved
    #[serde(rename = "MaxHR")]
    pub max_hr: i64,
    #[serde(rename = "ExerciseAngina")]
    pub exercise_angina: ExerciseAngina,
    /// ST depression induced by exercise relative to rest
    #[serde(rename = "Oldpeak")]
    pub oldpeak: f64,
    /// Up, Flat or Down
    #[serde(rename = "ST_Slope")]
    pub st_slope: String,
}

impl PatientRecord {
    /// Check constraints serde cannot express
    pub fn validate(&self) -> Result<(), EncodeError> {
        if !matches!(self.fasting_bs, 0 | 1) {
            return Err(EncodeError::InvalidBinary {
                field: "FastingBS",
                value: self.fasting_bs,
            });
        }
        Ok(())
    }
}
