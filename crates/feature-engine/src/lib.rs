//! Feature Engineering Engine
//!
//! Turns a validated [`PatientRecord`] into the numeric row a trained
//! heart-disease classifier expects: numeric fields copied by name,
//! categorical fields one-hot encoded against the model's column list.

mod encoder;
mod error;
mod layout;
mod record;

pub use encoder::{CategoryPolicy, FeatureEncoder, FeatureVector};
pub use error::{EncodeError, LayoutError};
pub use layout::{CategoricalField, ColumnLayout, NumericField, DEFAULT_TARGET_COLUMN};
pub use record::{ExerciseAngina, PatientRecord, Sex};
