//! Central Configuration Constants
//!
//! Single source of truth for model artifact names and detection defaults.

/// API version reported to clients
pub const API_VERSION: &str = "2.0.0";

/// App name
pub const APP_NAME: &str = "AccountGuard AI";

/// Crate version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Classifier defaults
// ============================================

/// Characters of free text handed to the text model
pub const MAX_MODEL_INPUT_CHARS: usize = 512;

/// Token budget when the model config does not declare one
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// Phishing verdicts strictly above this score are "high" threats
pub const DEFAULT_HIGH_THREAT_THRESHOLD: f32 = 0.8;

/// Reason attached to every verdict produced without a model
pub const MODEL_UNAVAILABLE_REASON: &str = "Model not available";

/// Display name / version tag of the URL model
pub const URL_MODEL_NAME: &str = "urlbert-tiny-v4";

/// Display name / version tag of the text model
pub const TEXT_MODEL_NAME: &str = "distilbert-v2.4.1";

/// Display name of the fraud model
pub const FRAUD_MODEL_NAME: &str = "isolation-forest";

// ============================================
// Artifact file names
// ============================================

/// ONNX graph inside a classifier directory
pub const ONNX_MODEL_FILE: &str = "model.onnx";

/// WordPiece vocabulary inside a classifier directory
pub const VOCAB_FILE: &str = "vocab.txt";

/// Hugging Face model config (id2label, max positions)
pub const MODEL_CONFIG_FILE: &str = "config.json";

/// Hugging Face tokenizer config (do_lower_case)
pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";

/// Versioned feature schema
pub const SCHEMA_FILE: &str = "schema.json";

/// Legacy ordered feature list (used when schema.json is absent)
pub const FEATURES_FILE: &str = "features.json";

/// Legacy categorical column list (used when schema.json is absent)
pub const CAT_COLS_FILE: &str = "cat_cols.json";

/// Imputer statistics
pub const IMPUTER_FILE: &str = "imputer.json";

/// One-hot encoder vocabulary
pub const ENCODER_FILE: &str = "encoder.json";

/// Isolation forest trees
pub const ISOLATION_FOREST_FILE: &str = "isolation_forest.json";
