//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use accountguard_core::constants::API_VERSION;
use accountguard_core::logic::features::LayoutInfo;
use accountguard_core::ModelStatus;

use crate::db;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
    database: &'static str,
    models: Vec<ModelStatus>,
    schema_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_layout: Option<LayoutInfo>,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, schema_version) = match &state.store {
        Some(pool) if db::ping(pool).await => {
            let version = db::schema_version(pool).await.unwrap_or_else(|e| {
                tracing::warn!("Failed to read store schema version: {}", e);
                None
            });
            ("connected", version)
        }
        _ => ("disconnected", None),
    };

    let models = state.detection.model_statuses();
    let all_loaded = models.iter().all(|m| m.loaded);
    let feature_layout = state
        .detection
        .fraud
        .get()
        .map(|detector| detector.preprocessor().schema().info());

    Json(HealthResponse {
        status: if all_loaded && database == "connected" { "healthy" } else { "degraded" },
        version: API_VERSION,
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
        models,
        schema_version,
        feature_layout,
    })
}
