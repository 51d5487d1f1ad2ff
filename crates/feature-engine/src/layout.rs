//! Column Layout
//!
//! Resolves the model's ordered column list into fixed indices once, so the
//! per-request encoder never builds or searches column names.

use crate::error::LayoutError;
use crate::record::PatientRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Label column present in the training column list
pub const DEFAULT_TARGET_COLUMN: &str = "HeartDisease";

/// Numeric record fields copied into the row unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Age,
    RestingBp,
    Cholesterol,
    FastingBs,
    MaxHr,
    Oldpeak,
}

impl NumericField {
    pub const ALL: [NumericField; 6] = [
        NumericField::Age,
        NumericField::RestingBp,
        NumericField::Cholesterol,
        NumericField::FastingBs,
        NumericField::MaxHr,
        NumericField::Oldpeak,
    ];

    /// Column name in the training data
    pub fn column(&self) -> &'static str {
        match self {
            NumericField::Age => "Age",
            NumericField::RestingBp => "RestingBP",
            NumericField::Cholesterol => "Cholesterol",
            NumericField::FastingBs => "FastingBS",
            NumericField::MaxHr => "MaxHR",
            NumericField::Oldpeak => "Oldpeak",
        }
    }

    /// Read this field from a record
    pub fn value(&self, record: &PatientRecord) -> f64 {
        match self {
            NumericField::Age => record.age as f64,
            NumericField::RestingBp => record.resting_bp as f64,
            NumericField::Cholesterol => record.cholesterol as f64,
            NumericField::FastingBs => record.fasting_bs as f64,
            NumericField::MaxHr => record.max_hr as f64,
            NumericField::Oldpeak => record.oldpeak,
        }
    }
}

/// Categorical record fields, one-hot encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Sex,
    ChestPainType,
    RestingEcg,
    ExerciseAngina,
    StSlope,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 5] = [
        CategoricalField::Sex,
        CategoricalField::ChestPainType,
        CategoricalField::RestingEcg,
        CategoricalField::ExerciseAngina,
        CategoricalField::StSlope,
    ];

    /// Field name, also the one-hot column prefix
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Sex => "Sex",
            CategoricalField::ChestPainType => "ChestPainType",
            CategoricalField::RestingEcg => "RestingECG",
            CategoricalField::ExerciseAngina => "ExerciseAngina",
            CategoricalField::StSlope => "ST_Slope",
        }
    }

    /// Every category the training data contained, sorted
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            CategoricalField::Sex => &["F", "M"],
            CategoricalField::ChestPainType => &["ASY", "ATA", "NAP", "TA"],
            CategoricalField::RestingEcg => &["LVH", "Normal", "ST"],
            CategoricalField::ExerciseAngina => &["N", "Y"],
            CategoricalField::StSlope => &["Down", "Flat", "Up"],
        }
    }

    /// Category dropped by first-level one-hot encoding
    pub fn reference(&self) -> &'static str {
        self.categories()[0]
    }

    /// Fields with more than two categories
    pub fn is_multi_valued(&self) -> bool {
        self.categories().len() > 2
    }

    /// Read this field's category from a record
    pub fn value<'a>(&self, record: &'a PatientRecord) -> &'a str {
        match self {
            CategoricalField::Sex => record.sex.as_str(),
            CategoricalField::ChestPainType => &record.chest_pain_type,
            CategoricalField::RestingEcg => &record.resting_ecg,
            CategoricalField::ExerciseAngina => record.exercise_angina.as_str(),
            CategoricalField::StSlope => &record.st_slope,
        }
    }

    /// One-hot column name for a category
    pub fn column_name(&self, category: &str) -> String {
        format!("{}_{}", self.name(), category)
    }
}

/// Feature columns of a trained model with every field resolved to an index
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    /// Feature columns in model order, target removed
    columns: Arc<Vec<String>>,
    /// Column name to position
    index: HashMap<String, usize>,
    /// Position of each numeric field, in `NumericField::ALL` order
    numeric: [usize; 6],
    /// Per categorical field, the column of each known category
    /// (aligned with `categories()`); `None` marks a category without a column
    categorical: [Vec<Option<usize>>; 5],
}

impl ColumnLayout {
    /// Build a layout from the model's column list, dropping `target`
    pub fn new<S: AsRef<str>>(columns: &[S], target: &str) -> Result<Self, LayoutError> {
        let columns: Vec<String> = columns
            .iter()
            .map(|c| c.as_ref().to_string())
            .filter(|c| c != target)
            .collect();

        if columns.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(LayoutError::DuplicateColumn(name.clone()));
            }
        }

        let mut numeric = [0usize; 6];
        for (slot, field) in numeric.iter_mut().zip(NumericField::ALL) {
            *slot = *index
                .get(field.column())
                .ok_or(LayoutError::MissingNumericColumn(field.column()))?;
        }

        let categorical = CategoricalField::ALL.map(|field| {
            field
                .categories()
                .iter()
                .map(|category| index.get(&field.column_name(category)).copied())
                .collect::<Vec<_>>()
        });

        for field in CategoricalField::ALL {
            let missing: Vec<&'static str> = field
                .categories()
                .iter()
                .zip(&categorical[field as usize])
                .filter(|(_, slot)| slot.is_none())
                .map(|(category, _)| *category)
                .collect();

            if missing.len() > 1 {
                return Err(LayoutError::AmbiguousReference {
                    field: field.name(),
                    categories: missing,
                });
            }
            if let Some(reference) = missing.first() {
                if *reference != field.reference() {
                    warn!(
                        "{} encodes '{}' as its reference category, expected '{}'",
                        field.name(),
                        reference,
                        field.reference()
                    );
                }
            }
        }

        for name in &columns {
            for field in CategoricalField::ALL {
                if let Some(category) = name.strip_prefix(&format!("{}_", field.name())) {
                    if !field.categories().contains(&category) {
                        warn!("Column {} has no known {} category, it will stay 0", name, field.name());
                    }
                }
            }
        }

        debug!("Resolved column layout: {} feature columns", columns.len());

        Ok(Self {
            columns: Arc::new(columns),
            index,
            numeric,
            categorical,
        })
    }

    /// Number of feature columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Feature column names in model order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Shared handle to the column names
    pub fn shared_columns(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Position of a numeric field
    pub fn numeric_index(&self, field: NumericField) -> usize {
        // ALL lists the variants in declaration order
        self.numeric[field as usize]
    }

    /// Resolve a category of a field.
    ///
    /// Returns `None` when `category` is not a known category of `field`,
    /// `Some(None)` when it is known but has no column (the reference
    /// category), and `Some(Some(i))` for its one-hot column.
    pub fn category_slot(&self, field: CategoricalField, category: &str) -> Option<Option<usize>> {
        field
            .categories()
            .iter()
            .position(|c| *c == category)
            .map(|pos| self.categorical[field as usize][pos])
    }
}
