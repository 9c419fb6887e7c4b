//! Phishing Classifiers
//!
//! URL and email/SMS adapters around a [`SequenceModel`].
//! Input: raw string. Output: [`VerdictResult`] in the domain vocabulary.
//!
//! A model that failed to load stays unavailable for the life of the process;
//! every call then returns the standing `unknown` verdict without retrying.

use std::path::Path;

use super::rules::{text_indicators, url_indicators};
use super::types::{Label, ModelStatus, VerdictResult};
use crate::constants::{MAX_MODEL_INPUT_CHARS, TEXT_MODEL_NAME, URL_MODEL_NAME};
use crate::logic::artifact::ArtifactError;
use crate::logic::model::{InferenceError, OnnxSequenceClassifier, SequenceModel};

// ============================================================================
// MODEL HANDLE
// ============================================================================

/// A model loaded at startup, or the reason it could not be
pub enum ModelHandle<M> {
    Ready(M),
    Unavailable { reason: String },
}

impl<M> ModelHandle<M> {
    /// Capture a load result; failures are logged, never propagated
    pub fn from_load(name: &str, result: Result<M, ArtifactError>) -> Self {
        match result {
            Ok(model) => {
                log::info!("{} model ready", name);
                ModelHandle::Ready(model)
            }
            Err(e) => {
                log::error!("Failed to load {} model: {}", name, e);
                ModelHandle::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn get(&self) -> Option<&M> {
        match self {
            ModelHandle::Ready(model) => Some(model),
            ModelHandle::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }

    pub fn status(&self, name: &str) -> ModelStatus {
        match self {
            ModelHandle::Ready(_) => ModelStatus {
                name: name.to_string(),
                loaded: true,
                reason: None,
            },
            ModelHandle::Unavailable { reason } => ModelStatus {
                name: name.to_string(),
                loaded: false,
                reason: Some(reason.clone()),
            },
        }
    }
}

type BoxedModel = Box<dyn SequenceModel>;

fn load_onnx(dir: &Path, name: &str, threads: usize) -> ModelHandle<BoxedModel> {
    let result = OnnxSequenceClassifier::load(dir, name, threads).map(|m| Box::new(m) as BoxedModel);
    ModelHandle::from_load(name, result)
}

// ============================================================================
// LABEL NORMALIZATION
// ============================================================================

/// URL model: `LABEL_1` is phishing, anything else benign
pub fn normalize_url_label(raw: &str) -> Label {
    if raw == "LABEL_1" {
        Label::Phishing
    } else {
        Label::Benign
    }
}

/// Text model: any label mentioning phishing (or `LABEL_1`) is phishing
pub fn normalize_text_label(raw: &str) -> Label {
    let lowered = raw.to_lowercase();
    if lowered.contains("phishing") || lowered.contains("label_1") {
        Label::Phishing
    } else {
        Label::Benign
    }
}

/// First `max` characters, on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ============================================================================
// URL CLASSIFIER
// ============================================================================

pub struct UrlClassifier {
    model: ModelHandle<BoxedModel>,
}

impl UrlClassifier {
    pub fn new(model: ModelHandle<BoxedModel>) -> Self {
        Self { model }
    }

    /// Load the ONNX URL model from `dir`; never fails
    pub fn load(dir: &Path, threads: usize) -> Self {
        Self::new(load_onnx(dir, URL_MODEL_NAME, threads))
    }

    pub fn status(&self) -> ModelStatus {
        self.model.status(URL_MODEL_NAME)
    }

    pub fn classify(&self, url: &str) -> Result<VerdictResult, InferenceError> {
        let cleaned = url.trim().to_lowercase();
        let risk_indicators = url_indicators(&cleaned);

        let model = match self.model.get() {
            Some(model) => model,
            None => return Ok(VerdictResult::unavailable(risk_indicators)),
        };

        let prediction = model.predict(&cleaned).map_err(|e| {
            log::error!("URL classification error: {}", e);
            e
        })?;

        let label = normalize_url_label(&prediction.label);
        log::debug!(
            "URL classified: label={}, raw={}, score={:.3}, {}us",
            label,
            prediction.label,
            prediction.score,
            prediction.inference_time_us
        );

        Ok(VerdictResult {
            label,
            score: prediction.score,
            reason: format!("{} classification (confidence: {:.3})", model.name(), prediction.score),
            risk_indicators,
            model_version: Some(model.name().to_string()),
            text_length: None,
        })
    }
}

// ============================================================================
// TEXT CLASSIFIER
// ============================================================================

pub struct TextClassifier {
    model: ModelHandle<BoxedModel>,
}

impl TextClassifier {
    pub fn new(model: ModelHandle<BoxedModel>) -> Self {
        Self { model }
    }

    /// Load the ONNX text model from `dir`; never fails
    pub fn load(dir: &Path, threads: usize) -> Self {
        Self::new(load_onnx(dir, TEXT_MODEL_NAME, threads))
    }

    pub fn status(&self) -> ModelStatus {
        self.model.status(TEXT_MODEL_NAME)
    }

    pub fn classify(&self, text: &str) -> Result<VerdictResult, InferenceError> {
        let risk_indicators = text_indicators(text);
        let text_length = text.chars().count();

        let model = match self.model.get() {
            Some(model) => model,
            None => {
                let mut verdict = VerdictResult::unavailable(risk_indicators);
                verdict.text_length = Some(text_length);
                return Ok(verdict);
            }
        };

        let prediction = model
            .predict(truncate_chars(text, MAX_MODEL_INPUT_CHARS))
            .map_err(|e| {
                log::error!("Text classification error: {}", e);
                e
            })?;

        let label = normalize_text_label(&prediction.label);
        log::debug!(
            "Text classified: label={}, raw={}, score={:.3}, {}us",
            label,
            prediction.label,
            prediction.score,
            prediction.inference_time_us
        );

        Ok(VerdictResult {
            label,
            score: prediction.score,
            reason: format!("{} phishing model (confidence: {:.3})", model.name(), prediction.score),
            risk_indicators,
            model_version: Some(model.name().to_string()),
            text_length: Some(text_length),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::RawPrediction;
    use crate::logic::threat::rules::RiskIndicator;
    use parking_lot::Mutex;

    /// Frozen model: fixed label and score, records what it was given
    struct FixedModel {
        label: &'static str,
        score: f32,
        seen: Mutex<Vec<String>>,
    }

    impl FixedModel {
        fn boxed(label: &'static str, score: f32) -> BoxedModel {
            Box::new(Self {
                label,
                score,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl SequenceModel for FixedModel {
        fn name(&self) -> &str {
            "fixed-test-model"
        }

        fn predict(&self, text: &str) -> Result<RawPrediction, InferenceError> {
            self.seen.lock().push(text.to_string());
            Ok(RawPrediction {
                label: self.label.to_string(),
                score: self.score,
                class_index: 0,
                inference_time_us: 1,
            })
        }
    }

    struct FailingModel;

    impl SequenceModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _text: &str) -> Result<RawPrediction, InferenceError> {
            Err(InferenceError::Runtime("session crashed".to_string()))
        }
    }

    #[test]
    fn test_url_label_mapping() {
        assert_eq!(normalize_url_label("LABEL_1"), Label::Phishing);
        assert_eq!(normalize_url_label("LABEL_0"), Label::Benign);
        assert_eq!(normalize_url_label("label_1"), Label::Benign);
    }

    #[test]
    fn test_text_label_mapping() {
        assert_eq!(normalize_text_label("phishing_url"), Label::Phishing);
        assert_eq!(normalize_text_label("Phishing"), Label::Phishing);
        assert_eq!(normalize_text_label("LABEL_1"), Label::Phishing);
        assert_eq!(normalize_text_label("legitimate_email"), Label::Benign);
    }

    #[test]
    fn test_url_classify_with_model() {
        let classifier = UrlClassifier::new(ModelHandle::Ready(FixedModel::boxed("LABEL_1", 0.93)));
        let verdict = classifier.classify("http://secure-verify-bank.tk").unwrap();

        assert_eq!(verdict.label, Label::Phishing);
        assert_eq!(verdict.score, 0.93);
        assert_eq!(verdict.risk_indicators, vec![RiskIndicator::SuspiciousKeywords]);
        assert_eq!(verdict.model_version.as_deref(), Some("fixed-test-model"));
    }

    #[test]
    fn test_heuristics_do_not_touch_score() {
        let classifier = UrlClassifier::new(ModelHandle::Ready(FixedModel::boxed("LABEL_0", 0.61)));
        let flagged = classifier.classify("https://bit.ly/secure-update").unwrap();
        let clean = classifier.classify("https://example.org").unwrap();

        assert_eq!(flagged.score, clean.score);
        assert_eq!(flagged.label, Label::Benign);
        assert_eq!(flagged.risk_indicators.len(), 2);
    }

    #[test]
    fn test_url_unavailable_still_flags() {
        let classifier = UrlClassifier::new(ModelHandle::unavailable("missing model.onnx"));
        let verdict = classifier.classify("http://secure-verify-bank.tk").unwrap();

        assert_eq!(verdict.label, Label::Unknown);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.reason, "Model not available");
        assert!(verdict.risk_indicators.contains(&RiskIndicator::SuspiciousKeywords));
        assert!(!classifier.status().loaded);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = TextClassifier::new(ModelHandle::Ready(FixedModel::boxed("phishing", 0.77)));
        let first = classifier.classify("Verify your account now").unwrap();
        let second = classifier.classify("Verify your account now").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_truncated_for_model() {
        let model = FixedModel {
            label: "legitimate_email",
            score: 0.9,
            seen: Mutex::new(Vec::new()),
        };
        let long_text = "é".repeat(MAX_MODEL_INPUT_CHARS + 100);

        let verdict = model.predict(truncate_chars(&long_text, MAX_MODEL_INPUT_CHARS)).unwrap();
        assert_eq!(verdict.label, "legitimate_email");
        assert_eq!(model.seen.lock()[0].chars().count(), MAX_MODEL_INPUT_CHARS);

        let classifier = TextClassifier::new(ModelHandle::Ready(Box::new(model)));
        let verdict = classifier.classify(&long_text).unwrap();
        assert_eq!(verdict.text_length, Some(MAX_MODEL_INPUT_CHARS + 100));
    }

    #[test]
    fn test_inference_error_propagates() {
        let classifier = TextClassifier::new(ModelHandle::Ready(Box::new(FailingModel)));
        let err = classifier.classify("hello").unwrap_err();
        assert!(matches!(err, InferenceError::Runtime(_)));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("ééé", 2), "éé");
    }
}
