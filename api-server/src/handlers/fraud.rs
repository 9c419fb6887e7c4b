//! Transaction fraud handler

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use accountguard_core::constants::FRAUD_MODEL_NAME;
use accountguard_core::logic::threat::classifier::truncate_chars;
use accountguard_core::{FraudPrediction, InputType, ModelHandle, ThreatLevel, TransactionRecord};

use super::{blocking, record_scan, RequestMeta};
use crate::models::NewThreatLog;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// One record, or an array of records
    pub data: Value,
}

/// Turn `data` into records, preserving order
pub fn parse_records(data: &Value) -> AppResult<Vec<TransactionRecord>> {
    let records = match data {
        Value::Object(_) => vec![TransactionRecord::try_from(data)?],
        Value::Array(items) if items.is_empty() => {
            return Err(AppError::ValidationError("data must contain at least one record".to_string()))
        }
        Value::Array(items) => {
            if !items.iter().all(Value::is_object) {
                return Err(AppError::ValidationError(
                    "every element of data must be an object".to_string(),
                ));
            }
            items
                .iter()
                .map(TransactionRecord::try_from)
                .collect::<Result<Vec<_>, _>>()?
        }
        _ => {
            return Err(AppError::ValidationError(
                "data must be an object or an array of objects".to_string(),
            ))
        }
    };
    Ok(records)
}

/// Score transactions with the isolation forest
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<FraudPrediction>> {
    let Json(req) = payload?;

    if let ModelHandle::Unavailable { reason } = &state.detection.fraud {
        return Err(AppError::ModelUnavailable {
            model: FRAUD_MODEL_NAME.to_string(),
            reason: reason.clone(),
        });
    }

    let records = parse_records(&req.data)?;
    let detection = state.detection.clone();
    let result = blocking(move || match detection.fraud.get() {
        Some(detector) => detector.predict(&records).map_err(AppError::from),
        None => Err(AppError::InternalError("fraud model vanished".to_string())),
    })
    .await??;

    tracing::info!(
        "Scored {} transaction(s), {} anomalous",
        result.len(),
        result.anomalous_count()
    );

    log_predictions(&state, &headers, &req.data, &result).await;
    Ok(Json(result))
}

async fn log_predictions(state: &AppState, headers: &HeaderMap, data: &Value, result: &FraudPrediction) {
    let inputs: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let meta = RequestMeta::from_headers(headers);
    let now = Utc::now();

    for ((input, &score), &verdict) in inputs.iter().zip(&result.anomaly_score).zip(&result.prediction) {
        let anomalous = verdict == -1;
        let serialized = input.to_string();

        record_scan(
            state,
            NewThreatLog {
                scan_id: Uuid::new_v4().to_string(),
                input_type: InputType::Transaction.to_string(),
                input_data: truncate_chars(&serialized, state.config.log_input_max_chars).to_string(),
                prediction: if anomalous { "fraud" } else { "legit" }.to_string(),
                confidence_score: score,
                model_reason: format!("{} decision score {:.4}", FRAUD_MODEL_NAME, score),
                risk_indicators: Vec::new(),
                threat_level: ThreatLevel::from_anomaly(anomalous).to_string(),
                content_length: None,
                source_ip: meta.source_ip.clone(),
                user_agent: meta.user_agent.clone(),
                timestamp: now,
            },
        )
        .await;
    }
}
