//! API error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use feature_engine::EncodeError;
use inference_engine::InferenceError;
use thiserror::Error;
use tracing::{debug, error};

/// Errors returned to HTTP clients as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not a well-formed patient record
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Not Found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest { status, .. } => *status,
            ApiError::Encode(EncodeError::InvalidCategory { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Encode(EncodeError::InvalidBinary { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Metric label for the error
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest { .. } => "invalid_request",
            ApiError::Encode(EncodeError::InvalidCategory { .. }) => "invalid_category",
            ApiError::Encode(EncodeError::InvalidBinary { .. }) => "invalid_value",
            ApiError::Inference(InferenceError::Scaling { .. }) => "scaling",
            ApiError::Inference(_) => "inference",
            ApiError::NotFound(_) => "not_found",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected ({}): {}", status, self);
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}
