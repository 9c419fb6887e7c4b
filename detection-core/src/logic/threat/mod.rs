//! Threat Module
//!
//! Turns model output into domain verdicts.
//!
//! ## Structure
//! - `types`: Labels, threat levels, verdicts
//! - `rules`: Static risk-indicator heuristics
//! - `classifier`: URL and text phishing classifiers
//! - `fraud`: Transaction fraud detector
//! - `context`: Startup loading of all models

pub mod classifier;
pub mod context;
pub mod fraud;
pub mod rules;
pub mod types;

pub use classifier::{ModelHandle, TextClassifier, UrlClassifier};
pub use context::{DetectionContext, ModelPaths};
pub use fraud::{FraudDetector, FraudError, FraudPrediction};
pub use rules::{text_indicators, url_indicators, RiskIndicator};
pub use types::{InputType, Label, ModelStatus, ThreatLevel, VerdictResult};
