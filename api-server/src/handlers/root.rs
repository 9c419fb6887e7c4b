//! Service banner

use axum::Json;
use serde_json::{json, Value};

use accountguard_core::constants::{API_VERSION, APP_NAME};

pub async fn banner() -> Json<Value> {
    Json(json!({
        "message": format!("{} - Threat Detection API", APP_NAME),
        "version": API_VERSION,
        "status": "operational",
        "endpoints": {
            "phishing_url": "/phishing/url",
            "phishing_text": "/phishing/text",
            "predict": "/predict",
            "analytics": "/analytics",
            "logs": "/logs",
            "health": "/health"
        }
    }))
}
