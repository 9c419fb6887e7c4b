//! Risk Indicator Rules
//!
//! Static keyword and pattern checks surfaced next to model verdicts for
//! explainability. Pure functions: they read the input and nothing else, and
//! never feed back into the model's score.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

// ============================================================================
// KEYWORD LISTS (constants, never change at runtime)
// ============================================================================

/// Link shorteners that hide the real destination
pub const URL_SHORTENERS: &[&str] = &["bit.ly", "tinyurl"];

/// Words phishing URLs borrow to look legitimate
pub const SUSPICIOUS_URL_KEYWORDS: &[&str] = &["secure", "verify", "update", "confirm"];

pub const URGENCY_WORDS: &[&str] = &[
    "urgent",
    "immediate",
    "expire",
    "suspend",
    "verify",
    "confirm",
    "click here",
];

pub const FINANCIAL_TERMS: &[&str] = &["bank", "account", "payment", "credit card", "paypal", "bitcoin"];

pub const PERSONAL_INFO_TERMS: &[&str] = &[
    "ssn",
    "social security",
    "password",
    "pin",
    "personal information",
];

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
        .expect("link pattern is a valid regex")
});

// ============================================================================
// INDICATORS
// ============================================================================

/// Heuristic flag; serialized as its human-readable description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskIndicator {
    UrlShortener,
    SuspiciousKeywords,
    UrgencyLanguage,
    ExternalLinks,
    FinancialContent,
    PersonalInfoRequest,
}

impl RiskIndicator {
    pub fn description(&self) -> &'static str {
        match self {
            RiskIndicator::UrlShortener => "URL shortener detected",
            RiskIndicator::SuspiciousKeywords => "Suspicious keywords detected",
            RiskIndicator::UrgencyLanguage => "Urgency indicators detected",
            RiskIndicator::ExternalLinks => "External links detected",
            RiskIndicator::FinancialContent => "Financial content detected",
            RiskIndicator::PersonalInfoRequest => "Personal information request",
        }
    }
}

impl std::fmt::Display for RiskIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

impl Serialize for RiskIndicator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.description())
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

// ============================================================================
// RULES
// ============================================================================

/// Indicators for a URL (case-insensitive, surrounding whitespace ignored)
pub fn url_indicators(url: &str) -> Vec<RiskIndicator> {
    let cleaned = url.trim().to_lowercase();
    let mut indicators = Vec::new();

    if contains_any(&cleaned, URL_SHORTENERS) {
        indicators.push(RiskIndicator::UrlShortener);
    }
    if contains_any(&cleaned, SUSPICIOUS_URL_KEYWORDS) {
        indicators.push(RiskIndicator::SuspiciousKeywords);
    }

    indicators
}

/// Indicators for email/SMS text; scans the full text, not the model's cut
pub fn text_indicators(text: &str) -> Vec<RiskIndicator> {
    let lowered = text.to_lowercase();
    let mut indicators = Vec::new();

    if contains_any(&lowered, URGENCY_WORDS) {
        indicators.push(RiskIndicator::UrgencyLanguage);
    }
    if LINK_PATTERN.is_match(text) {
        indicators.push(RiskIndicator::ExternalLinks);
    }
    if contains_any(&lowered, FINANCIAL_TERMS) {
        indicators.push(RiskIndicator::FinancialContent);
    }
    if contains_any(&lowered, PERSONAL_INFO_TERMS) {
        indicators.push(RiskIndicator::PersonalInfoRequest);
    }

    indicators
}
