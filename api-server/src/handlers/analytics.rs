//! Analytics handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::STORE_UNAVAILABLE;
use crate::models::ThreatLog;
use crate::{AppResult, AppState};

/// Aggregate counts over the whole log store
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    let unavailable = |timestamp: String| {
        Json(json!({
            "analytics": {},
            "message": STORE_UNAVAILABLE,
            "timestamp": timestamp
        }))
    };
    let Some(pool) = &state.store else {
        return Ok(unavailable(timestamp));
    };

    match ThreatLog::analytics(pool, state.config.recent_window_hours).await {
        Ok(analytics) => Ok(Json(json!({
            "analytics": analytics,
            "timestamp": timestamp
        }))),
        Err(e) => {
            tracing::warn!("Analytics query failed, answering without the store: {}", e);
            Ok(unavailable(timestamp))
        }
    }
}
