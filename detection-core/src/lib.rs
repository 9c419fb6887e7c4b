//! AccountGuard Detection Core
//!
//! Model adapters and rules behind the AccountGuard threat detection API:
//!
//! - URL and email/SMS phishing classifiers (ONNX sequence classifiers)
//! - Transaction fraud scoring (impute → encode → align → isolation forest)
//! - Static risk-indicator heuristics
//!
//! Everything here is loaded once and read-only afterwards, so a single
//! [`DetectionContext`] can be shared by every request.

pub mod constants;
pub mod logic;

pub use logic::artifact::ArtifactError;
pub use logic::features::{
    FeatureSchema, OneHotEncoder, Preprocessor, PreprocessingError, RawValue, SimpleImputer,
    TransactionRecord,
};
pub use logic::model::{AnomalyModel, AnomalyVerdict, InferenceError, IsolationForest, SequenceModel};
pub use logic::threat::{
    DetectionContext, FraudDetector, FraudError, FraudPrediction, InputType, Label, ModelHandle,
    ModelPaths, ModelStatus, RiskIndicator, TextClassifier, ThreatLevel, UrlClassifier,
    VerdictResult,
};
