//! Threat Types
//!
//! Core types for verdicts and log classification.
//! No logic beyond small conversions.

use serde::{Deserialize, Serialize};

use super::rules::RiskIndicator;
use crate::constants::{DEFAULT_HIGH_THREAT_THRESHOLD, MODEL_UNAVAILABLE_REASON};

// ============================================================================
// LABEL
// ============================================================================

/// Domain label of a URL/text verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Phishing,
    Benign,
    /// No model available
    Unknown,
    /// Inference failed
    Error,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Phishing => "phishing",
            Label::Benign => "benign",
            Label::Unknown => "unknown",
            Label::Error => "error",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// THREAT LEVEL
// ============================================================================

/// Severity stored with each log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
        }
    }

    /// Phishing above `high_threshold` (strict) is high, other phishing is
    /// medium, everything else is low
    pub fn from_verdict(label: Label, score: f32, high_threshold: f32) -> Self {
        match label {
            Label::Phishing if score > high_threshold => ThreatLevel::High,
            Label::Phishing => ThreatLevel::Medium,
            _ => ThreatLevel::Low,
        }
    }

    /// Transactions: anomalous is high, normal is low
    pub fn from_anomaly(is_anomalous: bool) -> Self {
        if is_anomalous {
            ThreatLevel::High
        } else {
            ThreatLevel::Low
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(ThreatLevel::Low),
            "medium" => Some(ThreatLevel::Medium),
            "high" => Some(ThreatLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// INPUT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Url,
    Text,
    Transaction,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Url => "url",
            InputType::Text => "text",
            InputType::Transaction => "transaction",
        }
    }
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT RESULT
// ============================================================================

/// Outcome of one URL/text classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictResult {
    pub label: Label,
    /// Model confidence in `label`; never touched by heuristics
    pub score: f32,
    pub reason: String,
    pub risk_indicators: Vec<RiskIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

impl VerdictResult {
    /// Standing verdict when the model never loaded
    pub fn unavailable(risk_indicators: Vec<RiskIndicator>) -> Self {
        Self {
            label: Label::Unknown,
            score: 0.0,
            reason: MODEL_UNAVAILABLE_REASON.to_string(),
            risk_indicators,
            model_version: None,
            text_length: None,
        }
    }

    /// Verdict describing a failed model call
    pub fn failed(message: &str) -> Self {
        Self {
            label: Label::Error,
            score: 0.0,
            reason: format!("Classification failed: {}", message),
            risk_indicators: Vec::new(),
            model_version: None,
            text_length: None,
        }
    }

    pub fn threat_level(&self, high_threshold: f32) -> ThreatLevel {
        ThreatLevel::from_verdict(self.label, self.score, high_threshold)
    }

    pub fn is_phishing(&self) -> bool {
        self.label == Label::Phishing
    }

    /// Indicator descriptions, in detection order
    pub fn indicator_descriptions(&self) -> Vec<String> {
        self.risk_indicators
            .iter()
            .map(|i| i.description().to_string())
            .collect()
    }
}

impl Default for VerdictResult {
    fn default() -> Self {
        Self::unavailable(Vec::new())
    }
}

/// Threat level with the default 0.8 cut-off
pub fn default_threat_level(label: Label, score: f32) -> ThreatLevel {
    ThreatLevel::from_verdict(label, score, DEFAULT_HIGH_THREAT_THRESHOLD)
}

// ============================================================================
// MODEL STATUS
// ============================================================================

/// Model availability for health reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub name: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_level_derivation() {
        assert_eq!(default_threat_level(Label::Phishing, 0.95), ThreatLevel::High);
        assert_eq!(default_threat_level(Label::Phishing, 0.8), ThreatLevel::Medium);
        assert_eq!(default_threat_level(Label::Phishing, 0.3), ThreatLevel::Medium);
        assert_eq!(default_threat_level(Label::Benign, 0.99), ThreatLevel::Low);
        assert_eq!(default_threat_level(Label::Unknown, 0.0), ThreatLevel::Low);
    }

    #[test]
    fn test_threat_level_parse() {
        assert_eq!(ThreatLevel::parse("HIGH"), Some(ThreatLevel::High));
        assert_eq!(ThreatLevel::parse(" medium "), Some(ThreatLevel::Medium));
        assert_eq!(ThreatLevel::parse("critical"), None);
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = VerdictResult {
            label: Label::Phishing,
            score: 0.5,
            reason: "test".to_string(),
            risk_indicators: vec![RiskIndicator::SuspiciousKeywords],
            model_version: Some("m1".to_string()),
            text_length: None,
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["label"], "phishing");
        assert_eq!(json["risk_indicators"][0], "Suspicious keywords detected");
        assert_eq!(json["model_version"], "m1");
        assert!(json.get("text_length").is_none());
    }

    #[test]
    fn test_unavailable_verdict() {
        let verdict = VerdictResult::unavailable(vec![]);
        assert_eq!(verdict.label, Label::Unknown);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.reason, MODEL_UNAVAILABLE_REASON);
    }
}
