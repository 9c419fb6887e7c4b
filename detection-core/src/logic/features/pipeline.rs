//! Preprocessing Pipeline
//!
//! Raw transaction records → the exact matrix the fraud model was fit on:
//!
//! 1. complete columns (schema order, absent keys become missing, extras dropped)
//! 2. impute missing cells
//! 3. one-hot encode the categorical subset
//! 4. assemble `[numeric columns…, encoder columns…]`
//!
//! The assembled column names are the model contract. They are checked
//! against the model's stored feature names when the detector is built, and
//! the row width is checked again on every transform.

use std::path::Path;

use ndarray::Array2;
use thiserror::Error;

use super::encoder::OneHotEncoder;
use super::imputer::{Cell, SimpleImputer};
use super::layout::{validate_column_order, FeatureSchema};
use super::record::TransactionRecord;
use crate::constants::{ENCODER_FILE, IMPUTER_FILE};
use crate::logic::artifact::ArtifactError;

// ============================================================================
// ERRORS
// ============================================================================

/// Malformed or misaligned transaction input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessingError {
    #[error("no transaction records supplied")]
    EmptyBatch,

    #[error("transaction record must be a JSON object")]
    NotAnObject,

    #[error("field `{field}`: unsupported {found} value")]
    UnsupportedValue { field: String, found: &'static str },

    #[error("field `{field}`: non-numeric value {value:?} in a numeric column")]
    NonNumeric { field: String, value: String },

    #[error("field `{field}`: unknown category {value:?}")]
    UnknownCategory { field: String, value: String },

    #[error("assembled {actual} columns where {expected} were expected")]
    WidthMismatch { expected: usize, actual: usize },
}

impl PreprocessingError {
    /// The offending field, when one can be named
    pub fn field(&self) -> Option<&str> {
        match self {
            PreprocessingError::UnsupportedValue { field, .. }
            | PreprocessingError::NonNumeric { field, .. }
            | PreprocessingError::UnknownCategory { field, .. } => Some(field),
            _ => None,
        }
    }
}

// ============================================================================
// PREPROCESSOR
// ============================================================================

/// Fitted preprocessing chain, immutable after construction
#[derive(Debug, Clone)]
pub struct Preprocessor {
    schema: FeatureSchema,
    imputer: SimpleImputer,
    encoder: OneHotEncoder,
    numeric_positions: Vec<usize>,
    categorical_positions: Vec<usize>,
    output_columns: Vec<String>,
}

impl Preprocessor {
    pub fn new(
        schema: FeatureSchema,
        imputer: SimpleImputer,
        encoder: OneHotEncoder,
    ) -> Result<Self, ArtifactError> {
        if imputer.width() != schema.len() {
            return Err(ArtifactError::Invalid(format!(
                "imputer has {} statistics for {} schema features",
                imputer.width(),
                schema.len()
            )));
        }
        if !imputer.columns.is_empty() {
            validate_column_order(schema.features(), &imputer.columns)?;
        }
        validate_column_order(schema.categorical(), encoder.columns())?;

        let numeric_positions: Vec<usize> = (0..schema.len())
            .filter(|&i| !schema.is_categorical_at(i))
            .collect();
        let categorical_positions: Vec<usize> = schema
            .categorical()
            .iter()
            .filter_map(|name| schema.index_of(name))
            .collect();

        let mut output_columns: Vec<String> = schema.numeric().map(str::to_string).collect();
        output_columns.extend(encoder.feature_names_out());

        Ok(Self {
            schema,
            imputer,
            encoder,
            numeric_positions,
            categorical_positions,
            output_columns,
        })
    }

    /// Load `schema.json` (or the legacy pair), `imputer.json` and `encoder.json`
    pub fn load_from_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let schema = FeatureSchema::load_from_dir(dir)?;
        let imputer = SimpleImputer::load(&dir.join(IMPUTER_FILE))?;
        let encoder = OneHotEncoder::load(&dir.join(ENCODER_FILE))?;
        Self::new(schema, imputer, encoder)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Assembled column names, model order
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    pub fn width(&self) -> usize {
        self.output_columns.len()
    }

    /// Transform a batch; one output row per record
    pub fn transform(&self, records: &[TransactionRecord]) -> Result<Array2<f64>, PreprocessingError> {
        if records.is_empty() {
            return Err(PreprocessingError::EmptyBatch);
        }

        let width = self.width();
        let mut data = Vec::with_capacity(records.len() * width);
        for record in records {
            data.extend(self.transform_row(record)?);
        }

        let actual = data.len();
        Array2::from_shape_vec((records.len(), width), data).map_err(|_| {
            PreprocessingError::WidthMismatch {
                expected: records.len() * width,
                actual,
            }
        })
    }

    /// Steps 1-2 only: one imputed cell per schema feature, schema order
    pub fn impute_row(&self, record: &TransactionRecord) -> Result<Vec<Cell>, PreprocessingError> {
        self.schema
            .features()
            .iter()
            .enumerate()
            .map(|(i, name)| self.imputer.impute(i, name, record.get(name)))
            .collect()
    }

    fn transform_row(&self, record: &TransactionRecord) -> Result<Vec<f64>, PreprocessingError> {
        let features = self.schema.features();
        let cells = self.impute_row(record)?;

        let mut row = Vec::with_capacity(self.width());
        for &pos in &self.numeric_positions {
            match &cells[pos] {
                Cell::Number(n) => row.push(*n),
                Cell::Text(s) => {
                    return Err(PreprocessingError::NonNumeric {
                        field: features[pos].clone(),
                        value: s.clone(),
                    })
                }
            }
        }

        // Step 3: encoder columns follow the numeric block
        let categories: Vec<String> = self
            .categorical_positions
            .iter()
            .map(|&pos| cells[pos].to_category())
            .collect();
        let start = row.len();
        row.resize(start + self.encoder.width(), 0.0);
        self.encoder.encode_into(&categories, &mut row[start..])?;

        // Step 4: width re-check against the contract
        if row.len() != self.width() {
            return Err(PreprocessingError::WidthMismatch {
                expected: self.width(),
                actual: row.len(),
            });
        }

        Ok(row)
    }
}
