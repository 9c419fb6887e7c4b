//! Fraud Detector
//!
//! Preprocessing chain + anomaly model. The column contract between the two
//! is checked once at construction; a mismatch refuses to load.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::constants::ISOLATION_FOREST_FILE;
use crate::logic::artifact::ArtifactError;
use crate::logic::features::{validate_column_order, Preprocessor, PreprocessingError, TransactionRecord};
use crate::logic::model::{AnomalyModel, InferenceError, IsolationForest};

#[derive(Debug, Error)]
pub enum FraudError {
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Per-record outputs, same order as the input batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudPrediction {
    pub anomaly_score: Vec<f64>,
    /// -1 anomalous, 1 normal
    pub prediction: Vec<i8>,
}

impl FraudPrediction {
    pub fn len(&self) -> usize {
        self.prediction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prediction.is_empty()
    }

    pub fn anomalous_count(&self) -> usize {
        self.prediction.iter().filter(|&&p| p == -1).count()
    }
}

pub struct FraudDetector {
    preprocessor: Preprocessor,
    model: Box<dyn AnomalyModel>,
}

impl FraudDetector {
    pub fn new(preprocessor: Preprocessor, model: Box<dyn AnomalyModel>) -> Result<Self, ArtifactError> {
        validate_column_order(model.feature_names(), preprocessor.output_columns())?;
        let info = preprocessor.schema().info();
        log::info!(
            "Fraud detector ready: schema v{} ({:08x}), {} raw features, {} model columns",
            info.version,
            info.hash,
            info.feature_count,
            preprocessor.width()
        );
        Ok(Self { preprocessor, model })
    }

    /// Load preprocessing artifacts and `isolation_forest.json` from `dir`
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let preprocessor = Preprocessor::load_from_dir(dir)?;
        let forest = IsolationForest::load(&dir.join(ISOLATION_FOREST_FILE))?;
        Self::new(preprocessor, Box::new(forest))
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn predict(&self, records: &[TransactionRecord]) -> Result<FraudPrediction, FraudError> {
        let matrix = self.preprocessor.transform(records)?;
        let anomaly_score = self.model.decision_scores(&matrix)?;
        let prediction = anomaly_score
            .iter()
            .map(|&score| self.model.verdict(score).as_label())
            .collect();

        log::debug!("Scored {} transaction(s)", records.len());
        Ok(FraudPrediction {
            anomaly_score,
            prediction,
        })
    }
}
