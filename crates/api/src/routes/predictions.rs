//! Prediction Routes

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use feature_engine::PatientRecord;
use inference_engine::PredictionResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};

/// Response for the prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// 0 = no heart disease, 1 = heart disease
    pub prediction: u8,
    pub probability_no_heart_disease: f64,
    pub probability_heart_disease: f64,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            prediction: result.label,
            probability_no_heart_disease: result.probability_no_disease,
            probability_heart_disease: result.probability_disease,
        }
    }
}

/// Predict heart disease for one patient record
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PatientRecord>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(record) = payload?;
    debug!(
        "Prediction request: age={}, sex={}, chest_pain={}",
        record.age,
        record.sex.as_str(),
        record.chest_pain_type
    );

    let prediction = state.predict(&record)?;
    Ok(Json(PredictionResponse::from(prediction)))
}
