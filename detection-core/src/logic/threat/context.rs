//! Detection Context
//!
//! Everything loaded at startup: both phishing classifiers and the fraud
//! detector. Each model is loaded independently; one failing never blocks
//! the others.

use std::path::PathBuf;

use super::classifier::{ModelHandle, TextClassifier, UrlClassifier};
use super::fraud::FraudDetector;
use super::types::ModelStatus;
use crate::constants::FRAUD_MODEL_NAME;

/// Artifact directories for each model
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub url_dir: PathBuf,
    pub text_dir: PathBuf,
    pub fraud_dir: PathBuf,
    /// Intra-op threads per ONNX session
    pub onnx_threads: usize,
}

impl ModelPaths {
    /// Conventional layout under one models directory
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            url_dir: root.join("url"),
            text_dir: root.join("text"),
            fraud_dir: root.join("fraud"),
            onnx_threads: 1,
        }
    }
}

pub struct DetectionContext {
    pub url: UrlClassifier,
    pub text: TextClassifier,
    pub fraud: ModelHandle<FraudDetector>,
}

impl DetectionContext {
    pub fn new(url: UrlClassifier, text: TextClassifier, fraud: ModelHandle<FraudDetector>) -> Self {
        Self { url, text, fraud }
    }

    pub fn load(paths: &ModelPaths) -> Self {
        log::info!("Loading models (url={:?}, text={:?}, fraud={:?})", paths.url_dir, paths.text_dir, paths.fraud_dir);

        let url = UrlClassifier::load(&paths.url_dir, paths.onnx_threads);
        let text = TextClassifier::load(&paths.text_dir, paths.onnx_threads);
        let fraud = ModelHandle::from_load(FRAUD_MODEL_NAME, FraudDetector::load(&paths.fraud_dir));

        let context = Self::new(url, text, fraud);
        let ready = context.model_statuses().iter().filter(|s| s.loaded).count();
        log::info!("{}/3 models ready", ready);
        context
    }

    pub fn model_statuses(&self) -> Vec<ModelStatus> {
        vec![
            self.url.status(),
            self.text.status(),
            self.fraud.status(FRAUD_MODEL_NAME),
        ]
    }
}
