//! One-hot encoder
//!
//! Each categorical column expands into one indicator per category seen at
//! fit time. The vocabulary is frozen; what happens to unseen values is an
//! explicit policy stored with the artifact.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::pipeline::PreprocessingError;
use crate::logic::artifact::{self, ArtifactError};

/// Handling of categories absent from the fitted vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Unseen value → all-zero indicator block for that column
    #[default]
    Ignore,
    /// Unseen value → `PreprocessingError::UnknownCategory`
    Error,
}

#[derive(Debug, Deserialize)]
struct RawEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    #[serde(default)]
    handle_unknown: UnknownPolicy,
}

/// Fitted one-hot encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawEncoder")]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    handle_unknown: UnknownPolicy,
    #[serde(skip)]
    lookup: Vec<HashMap<String, usize>>,
    #[serde(skip)]
    offsets: Vec<usize>,
}

impl TryFrom<RawEncoder> for OneHotEncoder {
    type Error = ArtifactError;

    fn try_from(raw: RawEncoder) -> Result<Self, Self::Error> {
        OneHotEncoder::new(raw.columns, raw.categories, raw.handle_unknown)
    }
}

impl OneHotEncoder {
    pub fn new(
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        handle_unknown: UnknownPolicy,
    ) -> Result<Self, ArtifactError> {
        if columns.len() != categories.len() {
            return Err(ArtifactError::Invalid(format!(
                "encoder has {} columns but {} category lists",
                columns.len(),
                categories.len()
            )));
        }

        let mut lookup = Vec::with_capacity(categories.len());
        let mut offsets = Vec::with_capacity(categories.len());
        let mut offset = 0;

        for (column, vocab) in columns.iter().zip(&categories) {
            let mut index = HashMap::with_capacity(vocab.len());
            for (i, category) in vocab.iter().enumerate() {
                if index.insert(category.clone(), i).is_some() {
                    return Err(ArtifactError::Invalid(format!(
                        "encoder column `{}` lists category {:?} twice",
                        column, category
                    )));
                }
            }
            lookup.push(index);
            offsets.push(offset);
            offset += vocab.len();
        }

        Ok(Self {
            columns,
            categories,
            handle_unknown,
            lookup,
            offsets,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        artifact::read_json(path)
    }

    /// Input columns, fit order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn policy(&self) -> UnknownPolicy {
        self.handle_unknown
    }

    /// Total number of indicator columns produced
    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Output names: `<column>_<category>`
    pub fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, vocab)| vocab.iter().map(move |cat| format!("{}_{}", column, cat)))
            .collect()
    }

    /// Encode one row of category strings (encoder column order) into `out`,
    /// which must be `width()` long and zeroed.
    pub fn encode_into(&self, values: &[String], out: &mut [f64]) -> Result<(), PreprocessingError> {
        if values.len() != self.columns.len() {
            return Err(PreprocessingError::WidthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        if out.len() != self.width() {
            return Err(PreprocessingError::WidthMismatch {
                expected: self.width(),
                actual: out.len(),
            });
        }

        for (col, value) in values.iter().enumerate() {
            match self.lookup[col].get(value) {
                Some(&pos) => out[self.offsets[col] + pos] = 1.0,
                None => match self.handle_unknown {
                    UnknownPolicy::Ignore => {
                        log::debug!("Unseen category {:?} in `{}`, encoded as zeros", value, self.columns[col]);
                    }
                    UnknownPolicy::Error => {
                        return Err(PreprocessingError::UnknownCategory {
                            field: self.columns[col].clone(),
                            value: value.clone(),
                        });
                    }
                },
            }
        }

        Ok(())
    }
}
