//! Detection logic
//!
//! - `features`: fraud feature schema and preprocessing pipeline
//! - `model`: inference backends (ONNX sequence classifiers, isolation forest)
//! - `threat`: verdicts, heuristics and the per-input classifiers

pub mod artifact;
pub mod features;
pub mod model;
pub mod threat;
