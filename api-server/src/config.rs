//! Configuration module

use std::env;
use std::path::PathBuf;

use accountguard_core::constants::DEFAULT_HIGH_THREAT_THRESHOLD;
use accountguard_core::ModelPaths;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server port
    pub port: u16,

    /// Root of the model artifact directories
    pub models_dir: PathBuf,

    pub url_model_dir: PathBuf,
    pub text_model_dir: PathBuf,
    pub fraud_model_dir: PathBuf,

    /// Intra-op threads per ONNX session
    pub onnx_threads: usize,

    /// Phishing scores strictly above this are "high" threats
    pub high_threat_threshold: f32,

    /// Trailing window for the "recent scans" count
    pub recent_window_hours: i64,

    /// Characters of scanned input kept in the log store
    pub log_input_max_chars: usize,

    /// "pretty" or "json"
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = PathBuf::from("models");
        Self {
            database_url: "sqlite://accountguard.db?mode=rwc".to_string(),
            port: 8000,
            url_model_dir: models_dir.join("url"),
            text_model_dir: models_dir.join("text"),
            fraud_model_dir: models_dir.join("fraud"),
            models_dir,
            onnx_threads: 1,
            high_threat_threshold: DEFAULT_HIGH_THREAT_THRESHOLD,
            recent_window_hours: 24,
            log_input_max_chars: 500,
            log_format: "pretty".to_string(),
            environment: "development".to_string(),
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let models_dir = env::var("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.models_dir);
        let model_dir = |key: &str, sub: &str| {
            env::var(key)
                .map(PathBuf::from)
                .unwrap_or_else(|_| models_dir.join(sub))
        };

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            port: parsed("PORT", defaults.port),

            url_model_dir: model_dir("URL_MODEL_DIR", "url"),
            text_model_dir: model_dir("TEXT_MODEL_DIR", "text"),
            fraud_model_dir: model_dir("FRAUD_MODEL_DIR", "fraud"),

            onnx_threads: parsed("ONNX_THREADS", defaults.onnx_threads).max(1),

            high_threat_threshold: parsed("HIGH_THREAT_THRESHOLD", defaults.high_threat_threshold),

            recent_window_hours: parsed("RECENT_WINDOW_HOURS", defaults.recent_window_hours).max(1),

            log_input_max_chars: parsed("LOG_INPUT_MAX_CHARS", defaults.log_input_max_chars),

            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),

            models_dir,
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths {
            url_dir: self.url_model_dir.clone(),
            text_dir: self.text_model_dir.clone(),
            fraud_dir: self.fraud_model_dir.clone(),
            onnx_threads: self.onnx_threads,
        }
    }
}
