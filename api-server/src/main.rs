//! AccountGuard AI Threat Detection Server
//!
//! HTTP front for the detection core: phishing verdicts for URLs and
//! email/SMS text, anomaly scores for transactions, and a queryable log of
//! every verdict.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ACCOUNTGUARD THREAT API                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────────┐  ┌───────────────┐ │
//! │  │  Router   │  │  DetectionContext   │  │  Analytics    │ │
//! │  │  (Axum)   │─▶│  URL / Text (ONNX)  │  │  (on demand)  │ │
//! │  │           │  │  Fraud (iForest)    │  │               │ │
//! │  └─────┬─────┘  └─────────────────────┘  └───────┬───────┘ │
//! │        └──────────────────┬──────────────────────┘         │
//! │                           ▼                                │
//! │                    ┌─────────────┐                         │
//! │                    │   SQLite    │                         │
//! │                    └─────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod models;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accountguard_core::constants::{API_VERSION, APP_NAME};
use accountguard_core::DetectionContext;

pub use error::{AppError, AppResult};

const DEFAULT_LOG_FILTER: &str = "accountguard_api=debug,accountguard_core=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("{} v{} starting ({})...", APP_NAME, API_VERSION, config.environment);

    // Log store; absence degrades /logs and /analytics instead of aborting
    let store = db::connect(&config.database_url).await;
    if store.is_some() {
        tracing::info!("Log store ready: {}", config.database_url);
    }

    // Models are loaded once and never reloaded
    tracing::info!("Models directory: {}", config.models_dir.display());
    let paths = config.model_paths();
    let detection = tokio::task::spawn_blocking(move || DetectionContext::load(&paths))
        .await
        .context("model loading task failed")?;

    let state = AppState {
        store,
        detection: Arc::new(detection),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Option<SqlitePool>,
    pub detection: Arc<DetectionContext>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root::banner))
        .route("/health", get(handlers::health::check))
        // Detection
        .route("/phishing/url", post(handlers::phishing::scan_url))
        .route("/phishing/text", post(handlers::phishing::scan_text))
        .route("/predict", post(handlers::fraud::predict))
        // Log store
        .route("/logs", get(handlers::logs::list))
        .route("/analytics", get(handlers::analytics::summary))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
