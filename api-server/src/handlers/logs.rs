//! Log retrieval handler

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use accountguard_core::ThreatLevel;

use super::STORE_UNAVAILABLE;
use crate::models::{LogFilter, ThreatLog};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<ThreatLog>,
    pub total_count: i64,
    pub query_limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Newest entries first, optionally filtered by threat level
pub async fn list(
    State(state): State<AppState>,
    Query(mut filter): Query<LogFilter>,
) -> AppResult<Json<LogsResponse>> {
    if let Some(level) = filter.threat_level.take() {
        let parsed = ThreatLevel::parse(&level).ok_or_else(|| {
            AppError::ValidationError(format!("unknown threat_level `{}`", level))
        })?;
        filter.threat_level = Some(parsed.to_string());
    }
    let query_limit = filter.effective_limit();

    let unavailable = LogsResponse {
        logs: Vec::new(),
        total_count: 0,
        query_limit,
        message: Some(STORE_UNAVAILABLE),
    };
    let Some(pool) = &state.store else {
        return Ok(Json(unavailable));
    };

    let queried = async {
        let logs = ThreatLog::list(pool, &filter).await?;
        let total_count = ThreatLog::count(pool, filter.threat_level.as_deref()).await?;
        Ok::<_, sqlx::Error>((logs, total_count))
    };

    match queried.await {
        Ok((logs, total_count)) => Ok(Json(LogsResponse {
            logs,
            total_count,
            query_limit,
            message: None,
        })),
        Err(e) => {
            tracing::warn!("Log query failed, answering without the store: {}", e);
            Ok(Json(unavailable))
        }
    }
}
