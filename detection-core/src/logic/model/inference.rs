//! Inference Engine - ONNX Sequence Classifiers
//!
//! Loads a Hugging Face style classifier directory exported to ONNX:
//!
//! ```text
//! <dir>/model.onnx             graph (input_ids, attention_mask[, token_type_ids]) → logits
//! <dir>/vocab.txt              WordPiece vocabulary
//! <dir>/config.json            id2label, max_position_embeddings (optional)
//! <dir>/tokenizer_config.json  do_lower_case, model_max_length (optional)
//! ```
//!
//! Kept apart from the classifiers so the backend can be swapped.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::time::Instant;

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use serde::Deserialize;
use thiserror::Error;

use super::tokenizer::WordPieceTokenizer;
use crate::constants::{
    DEFAULT_MAX_SEQUENCE_LENGTH, MODEL_CONFIG_FILE, ONNX_MODEL_FILE, TOKENIZER_CONFIG_FILE, VOCAB_FILE,
};
use crate::logic::artifact::{self, ArtifactError};

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// A model call failed at request time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("model input has {actual} columns, expected {expected}")]
    Shape { expected: usize, actual: usize },

    #[error("unsupported model input `{0}`")]
    UnsupportedInput(String),

    #[error("model produced no output")]
    NoOutput,

    #[error("ONNX runtime error: {0}")]
    Runtime(String),
}

fn runtime<E: Display>(err: E) -> InferenceError {
    InferenceError::Runtime(err.to_string())
}

fn onnx_error<E: Display>(path: &Path) -> impl Fn(E) -> ArtifactError + '_ {
    move |err| ArtifactError::Onnx {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Top-1 output of a sequence classifier, model vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Model label, e.g. `LABEL_1` or `phishing_url`
    pub label: String,
    /// Softmax probability of `label`
    pub score: f32,
    pub class_index: usize,
    pub inference_time_us: u64,
}

/// Text in, top-1 label out
pub trait SequenceModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, text: &str) -> Result<RawPrediction, InferenceError>;
}

#[derive(Debug, Default, Deserialize)]
struct HfModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
    max_position_embeddings: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct HfTokenizerConfig {
    do_lower_case: Option<bool>,
    /// `null` or absent means "follow do_lower_case"
    strip_accents: Option<bool>,
    // Often a sentinel like 1e30
    model_max_length: Option<f64>,
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxSequenceClassifier {
    name: String,
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    tokenizer: WordPieceTokenizer,
    id2label: Vec<String>,
    input_names: Vec<String>,
    output_name: String,
    max_length: usize,
}

impl OnnxSequenceClassifier {
    /// Load a classifier directory
    pub fn load(dir: &Path, name: &str, threads: usize) -> Result<Self, ArtifactError> {
        let model_path = dir.join(ONNX_MODEL_FILE);
        log::info!("Loading ONNX model {} from: {}", name, model_path.display());

        if !model_path.exists() {
            return Err(ArtifactError::NotFound(model_path));
        }

        let config: HfModelConfig =
            artifact::read_optional_json(&dir.join(MODEL_CONFIG_FILE))?.unwrap_or_default();
        let tok_config: HfTokenizerConfig =
            artifact::read_optional_json(&dir.join(TOKENIZER_CONFIG_FILE))?.unwrap_or_default();

        let lowercase = tok_config.do_lower_case.unwrap_or(true);
        let tokenizer = WordPieceTokenizer::from_vocab_file(&dir.join(VOCAB_FILE), lowercase)?
            .with_strip_accents(tok_config.strip_accents.unwrap_or(lowercase));

        let session = Session::builder()
            .map_err(onnx_error(&model_path))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_error(&model_path))?
            .with_intra_threads(threads.max(1))
            .map_err(onnx_error(&model_path))?
            .commit_from_file(&model_path)
            .map_err(onnx_error(&model_path))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "logits")
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::Invalid(format!("{} defines no outputs", name)))?;

        let max_length = resolve_max_length(&config, &tok_config);
        let id2label = ordered_labels(&config.id2label);

        log::info!(
            "ONNX model {} loaded: inputs={:?}, output={}, labels={:?}, max_length={}, vocab={}",
            name,
            input_names,
            output_name,
            id2label,
            max_length,
            tokenizer.vocab_size()
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            tokenizer,
            id2label,
            input_names,
            output_name,
            max_length,
        })
    }

    fn label_for(&self, index: usize) -> String {
        self.id2label
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", index))
    }
}

impl SequenceModel for OnnxSequenceClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, text: &str) -> Result<RawPrediction, InferenceError> {
        let start_time = Instant::now();

        let encoding = self.tokenizer.encode(text, self.max_length);
        let shape = vec![1_i64, encoding.len() as i64];

        let mut inputs = Vec::with_capacity(self.input_names.len());
        for name in &self.input_names {
            let data = match name.as_str() {
                "input_ids" => encoding.input_ids.clone(),
                "attention_mask" => encoding.attention_mask.clone(),
                "token_type_ids" => encoding.token_type_ids.clone(),
                other => return Err(InferenceError::UnsupportedInput(other.to_string())),
            };
            let tensor = Tensor::from_array((shape.clone(), data)).map_err(runtime)?;
            inputs.push((name.as_str(), tensor));
        }

        let logits: Vec<f32> = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs).map_err(runtime)?;
            let output = outputs.get(&self.output_name).ok_or(InferenceError::NoOutput)?;
            let (_, data) = output.try_extract_tensor::<f32>().map_err(runtime)?;
            data.to_vec()
        };

        let probabilities = softmax(&logits);
        let (class_index, score) = probabilities
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(InferenceError::NoOutput)?;

        Ok(RawPrediction {
            label: self.label_for(class_index),
            score,
            class_index,
            inference_time_us: start_time.elapsed().as_micros() as u64,
        })
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

fn ordered_labels(id2label: &HashMap<String, String>) -> Vec<String> {
    let mut indexed: Vec<(usize, &String)> = id2label
        .iter()
        .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);

    let mut labels = Vec::with_capacity(indexed.len());
    for (i, label) in indexed {
        while labels.len() < i {
            labels.push(format!("LABEL_{}", labels.len()));
        }
        labels.push(label.clone());
    }
    labels
}

fn resolve_max_length(config: &HfModelConfig, tok: &HfTokenizerConfig) -> usize {
    let from_tokenizer = tok
        .model_max_length
        .filter(|&n| n > 0.0 && n < 1_000_000.0)
        .map(|n| n as usize);

    match (config.max_position_embeddings, from_tokenizer) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => DEFAULT_MAX_SEQUENCE_LENGTH,
    }
}
