//! HTTP handlers

pub mod analytics;
pub mod fraud;
pub mod health;
pub mod logs;
pub mod phishing;
pub mod root;

use axum::http::{header, HeaderMap};

use crate::models::{NewThreatLog, ThreatLog};
use crate::{AppError, AppResult, AppState};

pub const STORE_UNAVAILABLE: &str = "Database not available";

/// Caller metadata stored alongside each verdict
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub source_ip: String,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let source_ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or("unknown")
            .to_string();

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self { source_ip, user_agent }
    }
}

/// Append to the log store; failures never reach the caller
pub async fn record_scan(state: &AppState, entry: NewThreatLog) {
    let Some(pool) = &state.store else {
        tracing::debug!("Log store unavailable, scan {} not recorded", entry.scan_id);
        return;
    };

    let scan_id = entry.scan_id.clone();
    if let Err(e) = ThreatLog::insert(pool, entry).await {
        tracing::warn!("Failed to record scan {}: {}", scan_id, e);
    }
}

/// Run model inference off the async workers
pub async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::InternalError(format!("inference task failed: {}", e)))
}
