//! Feature Layout - Versioned Fraud Feature Schema
//!
//! **This file controls the fraud model's column contract.**
//!
//! ## Rules (never break these):
//! 1. Add, remove or reorder a feature → bump `version`
//! 2. Change the categorical subset → bump `version`
//!
//! The schema is loaded once from the model directory and shared read-only.
//! Its CRC32 layout hash lets the serving side detect drift against the
//! artifacts it was fit with.

use std::collections::HashSet;
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{CAT_COLS_FILE, FEATURES_FILE, SCHEMA_FILE};
use crate::logic::artifact::{self, ArtifactError};

/// Version assumed for artifacts that predate `schema.json`
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// ERRORS
// ============================================================================

/// Schema violates its own invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema has no features")]
    Empty,
    #[error("feature `{0}` listed more than once")]
    Duplicate(String),
    #[error("categorical feature `{0}` is not in the feature list")]
    UnknownCategorical(String),
}

/// Pipeline output columns disagree with the columns the model was fit on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column order mismatch at position {position}: model expects {expected:?}, pipeline produces {actual:?}")]
pub struct LayoutMismatchError {
    pub position: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Compare two ordered column lists; the first divergence is reported
pub fn validate_column_order(expected: &[String], actual: &[String]) -> Result<(), LayoutMismatchError> {
    let longest = expected.len().max(actual.len());
    for position in 0..longest {
        let e = expected.get(position);
        let a = actual.get(position);
        if e != a {
            return Err(LayoutMismatchError {
                position,
                expected: e.cloned(),
                actual: a.cloned(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default = "legacy_version")]
    version: u32,
    features: Vec<String>,
    #[serde(default)]
    categorical: Vec<String>,
}

fn legacy_version() -> u32 {
    LEGACY_SCHEMA_VERSION
}

/// Ordered feature names plus the categorical subset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct FeatureSchema {
    version: u32,
    features: Vec<String>,
    categorical: Vec<String>,
    #[serde(skip)]
    is_categorical: Vec<bool>,
}

impl TryFrom<RawSchema> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        FeatureSchema::new(raw.version, raw.features, raw.categorical)
    }
}

impl FeatureSchema {
    pub fn new(
        version: u32,
        features: Vec<String>,
        categorical: Vec<String>,
    ) -> Result<Self, SchemaError> {
        if features.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::with_capacity(features.len());
        for name in &features {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }

        let mut seen_cat = HashSet::with_capacity(categorical.len());
        for name in &categorical {
            if !seen.contains(name.as_str()) {
                return Err(SchemaError::UnknownCategorical(name.clone()));
            }
            if !seen_cat.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }

        let is_categorical = features
            .iter()
            .map(|f| seen_cat.contains(f.as_str()))
            .collect();

        Ok(Self {
            version,
            features,
            categorical,
            is_categorical,
        })
    }

    /// Load from a model directory.
    ///
    /// Prefers `schema.json`; falls back to the legacy `features.json` +
    /// `cat_cols.json` pair at [`LEGACY_SCHEMA_VERSION`].
    pub fn load_from_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let schema_path = dir.join(SCHEMA_FILE);
        if schema_path.exists() {
            return artifact::read_json(&schema_path);
        }

        let features: Vec<String> = artifact::read_json(&dir.join(FEATURES_FILE))?;
        let categorical: Vec<String> =
            artifact::read_optional_json(&dir.join(CAT_COLS_FILE))?.unwrap_or_default();

        Ok(Self::new(LEGACY_SCHEMA_VERSION, features, categorical)?)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// All features in fit order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Categorical subset in encoder order
    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether the feature at `index` (schema order) is categorical
    pub fn is_categorical_at(&self, index: usize) -> bool {
        self.is_categorical.get(index).copied().unwrap_or(false)
    }

    /// Non-categorical features in schema order
    pub fn numeric(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .zip(&self.is_categorical)
            .filter(|(_, cat)| !**cat)
            .map(|(name, _)| name.as_str())
    }

    /// Get feature index by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|n| n == name)
    }

    /// CRC32 over version, feature order and categorical order
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();

        hasher.update(&self.version.to_le_bytes());

        for name in &self.features {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
        }
        // Separates the two lists so moving a name across them changes the hash
        hasher.update(&[0xff]);
        for name in &self.categorical {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
        }

        hasher.finalize()
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            version: self.version,
            hash: self.layout_hash(),
            feature_count: self.features.len(),
            categorical_count: self.categorical.len(),
        }
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Summary for logging and the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutInfo {
    pub version: u32,
    pub hash: u32,
    pub feature_count: usize,
    pub categorical_count: usize,
}

// ============================================================================
// TESTS
// ============================================================================
