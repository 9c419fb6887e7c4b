//! Artifact loading
//!
//! Pretrained artifacts (schema, imputer, encoder, trees, vocabularies) are
//! plain files produced offline. They are read once at startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::features::layout::{LayoutMismatchError, SchemaError};

/// Failure to load or validate a pretrained artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid feature schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("failed to load ONNX model {}: {}", .path.display(), .message)]
    Onnx { path: PathBuf, message: String },

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Read a whole text artifact
pub fn read_text(path: &Path) -> Result<String, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and deserialize a JSON artifact
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an optional JSON artifact; a missing file is `Ok(None)`
pub fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ArtifactError> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}
