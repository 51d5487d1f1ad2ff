//! Feature Vector Assembly

use crate::error::EncodeError;
use crate::layout::{CategoricalField, ColumnLayout, NumericField};
use crate::record::PatientRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How categorical values without a one-hot column are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Every field accepts exactly its known categories
    #[default]
    Strict,
    /// Column-existence checks of the first deployed service: ChestPainType
    /// needs a column for every value, RestingECG and ST_Slope only for
    /// Normal/ST and Up/Flat, anything else passes as all zeros
    Legacy,
}

impl CategoryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryPolicy::Strict => "strict",
            CategoryPolicy::Legacy => "legacy",
        }
    }
}

/// Numeric row aligned to the model's feature columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Arc<Vec<String>>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair values with their column names
    pub fn from_parts(columns: Arc<Vec<String>>, values: Vec<f64>) -> Self {
        Self { columns, values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx).copied()
    }

    /// Column names with their values, in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Encodes patient records against a fixed column layout
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    layout: ColumnLayout,
    policy: CategoryPolicy,
}

impl FeatureEncoder {
    /// Create an encoder for a resolved layout
    pub fn new(layout: ColumnLayout, policy: CategoryPolicy) -> Self {
        debug!(
            "Creating feature encoder: width={}, policy={}",
            layout.width(),
            policy.as_str()
        );
        Self { layout, policy }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    /// Encode one record into a row of `layout().width()` values
    pub fn encode(&self, record: &PatientRecord) -> Result<FeatureVector, EncodeError> {
        record.validate()?;

        let mut values = vec![0.0; self.layout.width()];

        for field in NumericField::ALL {
            values[self.layout.numeric_index(field)] = field.value(record);
        }

        for field in CategoricalField::ALL {
            let category = field.value(record);
            let slot = match self.policy {
                CategoryPolicy::Strict => self.strict_slot(field, category)?,
                CategoryPolicy::Legacy => self.legacy_slot(field, category)?,
            };
            if let Some(idx) = slot {
                values[idx] = 1.0;
            }
        }

        Ok(FeatureVector::from_parts(self.layout.shared_columns(), values))
    }

    fn strict_slot(
        &self,
        field: CategoricalField,
        category: &str,
    ) -> Result<Option<usize>, EncodeError> {
        self.layout
            .category_slot(field, category)
            .ok_or_else(|| EncodeError::InvalidCategory {
                field: field.name(),
                value: category.to_string(),
            })
    }

    fn legacy_slot(
        &self,
        field: CategoricalField,
        category: &str,
    ) -> Result<Option<usize>, EncodeError> {
        let slot = self.layout.column_index(&field.column_name(category));
        if slot.is_none() && legacy_requires_column(field, category) {
            return Err(EncodeError::InvalidCategory {
                field: field.name(),
                value: category.to_string(),
            });
        }
        Ok(slot)
    }
}

fn legacy_requires_column(field: CategoricalField, category: &str) -> bool {
    match field {
        CategoricalField::ChestPainType => true,
        CategoricalField::RestingEcg => matches!(category, "Normal" | "ST"),
        CategoricalField::StSlope => matches!(category, "Up" | "Flat"),
        CategoricalField::Sex | CategoricalField::ExerciseAngina => false,
    }
}
