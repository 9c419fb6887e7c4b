//! Phishing scan handlers (URL and email/SMS text)

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use accountguard_core::constants::API_VERSION;
use accountguard_core::logic::threat::classifier::truncate_chars;
use accountguard_core::{InputType, VerdictResult};

use super::{blocking, record_scan, RequestMeta};
use crate::models::NewThreatLog;
use crate::{AppError, AppResult, AppState};

/// Characters of scanned text echoed back in the response
const ECHO_MAX_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct UrlScanRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    #[serde(rename = "type")]
    pub input_type: InputType,
    pub input: String,
    pub scan_id: Uuid,
    pub result: VerdictResult,
    pub timestamp: String,
    pub api_version: &'static str,
}

/// Classify a URL
pub async fn scan_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UrlScanRequest>, JsonRejection>,
) -> AppResult<Json<ScanResponse>> {
    let Json(req) = payload?;
    if req.url.trim().is_empty() {
        return Err(AppError::ValidationError("url must not be empty".to_string()));
    }

    let detection = state.detection.clone();
    let url = req.url.clone();
    let verdict = blocking(move || detection.url.classify(&url)).await??;

    let response = finish_scan(&state, &headers, InputType::Url, &req.url, req.url.clone(), verdict, None).await;
    Ok(Json(response))
}

/// Classify a raw email/SMS body
pub async fn scan_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ScanResponse>> {
    if body.trim().is_empty() {
        return Err(AppError::ValidationError("text must not be empty".to_string()));
    }

    let detection = state.detection.clone();
    let text = body.clone();
    let verdict = blocking(move || detection.text.classify(&text)).await??;

    let content_length = body.chars().count();
    let echo = if content_length > ECHO_MAX_CHARS {
        format!("{}...", truncate_chars(&body, ECHO_MAX_CHARS))
    } else {
        body.clone()
    };

    let response = finish_scan(
        &state,
        &headers,
        InputType::Text,
        &body,
        echo,
        verdict,
        Some(content_length as i64),
    )
    .await;
    Ok(Json(response))
}

/// Log the verdict and build the response
async fn finish_scan(
    state: &AppState,
    headers: &HeaderMap,
    input_type: InputType,
    input: &str,
    echo: String,
    verdict: VerdictResult,
    content_length: Option<i64>,
) -> ScanResponse {
    let scan_id = Uuid::new_v4();
    let now = Utc::now();
    let threat_level = verdict.threat_level(state.config.high_threat_threshold);
    let meta = RequestMeta::from_headers(headers);

    tracing::info!(
        "{} scan {}: {} ({:.3}, threat={})",
        input_type,
        scan_id,
        verdict.label,
        verdict.score,
        threat_level
    );

    record_scan(
        state,
        NewThreatLog {
            scan_id: scan_id.to_string(),
            input_type: input_type.to_string(),
            input_data: truncate_chars(input, state.config.log_input_max_chars).to_string(),
            prediction: verdict.label.to_string(),
            confidence_score: verdict.score as f64,
            model_reason: verdict.reason.clone(),
            risk_indicators: verdict.indicator_descriptions(),
            threat_level: threat_level.to_string(),
            content_length,
            source_ip: meta.source_ip,
            user_agent: meta.user_agent,
            timestamp: now,
        },
    )
    .await;

    ScanResponse {
        input_type,
        input: echo,
        scan_id,
        result: verdict,
        timestamp: now.to_rfc3339(),
        api_version: API_VERSION,
    }
}
