//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use accountguard_core::{FraudError, InferenceError, PreprocessingError, VerdictResult};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),

    /// Record could not be turned into model input
    Preprocessing {
        field: Option<String>,
        message: String,
    },

    // Model errors
    Inference(String),
    ModelUnavailable {
        model: String,
        reason: String,
    },

    // Database errors
    DatabaseError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, mut body) = match &self {
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg }),
            ),
            AppError::Preprocessing { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "field": field }),
            ),
            AppError::Inference(msg) => {
                tracing::error!("Inference error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Classification failed",
                        "result": VerdictResult::failed(msg),
                    }),
                )
            }
            AppError::ModelUnavailable { model, reason } => {
                tracing::warn!("Request for unavailable model {}: {}", model, reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Model not available", "model": model, "reason": reason }),
                )
            }
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error occurred" }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        body["status"] = json!(status.as_u16());

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PreprocessingError> for AppError {
    fn from(err: PreprocessingError) -> Self {
        AppError::Preprocessing {
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Inference(err.to_string())
    }
}

impl From<FraudError> for AppError {
    fn from(err: FraudError) -> Self {
        match err {
            FraudError::Preprocessing(e) => e.into(),
            FraudError::Inference(e) => e.into(),
        }
    }
}
