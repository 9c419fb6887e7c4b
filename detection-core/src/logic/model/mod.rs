//! Model Module - Inference Backends
//!
//! Backends only score; mapping to domain verdicts lives in `threat`.

pub mod inference;
pub mod isolation_forest;
pub mod tokenizer;

// Re-export common types
pub use inference::{InferenceError, OnnxSequenceClassifier, RawPrediction, SequenceModel};
pub use isolation_forest::{AnomalyModel, AnomalyVerdict, IsolationForest, IsolationTree};
pub use tokenizer::WordPieceTokenizer;
