//! Model Metadata Route

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Description of the loaded artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub classifier: String,
    pub scaler: String,
    pub category_policy: String,
    pub target_column: String,
    pub n_features: usize,
    /// Feature columns in model order
    pub feature_columns: Vec<String>,
}

/// Get the loaded model description
pub async fn get_model(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let layout = state.encoder.layout();

    Json(ModelInfoResponse {
        classifier: state.engine.classifier().kind().to_string(),
        scaler: state.engine.scaler().kind().to_string(),
        category_policy: state.encoder.policy().as_str().to_string(),
        target_column: state.target_column.clone(),
        n_features: layout.width(),
        feature_columns: layout.columns().to_vec(),
    })
}
