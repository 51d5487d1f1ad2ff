//! Encoding Error Types

use thiserror::Error;

/// Errors while encoding a single patient record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// Categorical value with no matching one-hot column
    #[error("Invalid {field}: {value}")]
    InvalidCategory { field: &'static str, value: String },

    /// Binary indicator outside {0, 1}
    #[error("{field} must be 0 or 1, got {value}")]
    InvalidBinary { field: &'static str, value: i64 },
}

impl EncodeError {
    /// Name of the offending record field
    pub fn field(&self) -> &'static str {
        match self {
            EncodeError::InvalidCategory { field, .. } => field,
            EncodeError::InvalidBinary { field, .. } => field,
        }
    }
}

/// Errors while resolving the model's column list into a layout
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Column list has no feature columns")]
    Empty,

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Missing numeric column: {0}")]
    MissingNumericColumn(&'static str),

    /// More than one category of a field has no column, so the
    /// all-zero encoding would not identify a single reference category
    #[error("{field} has no column for categories {categories:?}")]
    AmbiguousReference {
        field: &'static str,
        categories: Vec<&'static str>,
    },
}
