//! Model Artifact Store
//!
//! Reads the three artifacts produced by offline training (feature column
//! list, fitted scaler, classifier) once at startup and checks that they
//! belong together. Any failure here must stop the service from starting.

mod artifacts;
mod store;

pub use artifacts::ModelArtifacts;
pub use store::{ArtifactPaths, ArtifactStore};

use feature_engine::LayoutError;
use inference_engine::InferenceError;
use thiserror::Error;

/// Startup failures while loading artifacts
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("Unsupported artifact format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid column layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("Invalid model artifact: {0}")]
    Model(#[from] InferenceError),
    #[error("Inconsistent artifacts: {0}")]
    Inconsistent(String),
}
