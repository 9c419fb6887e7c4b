//! Router tests against an in-memory store and frozen models

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use accountguard_core::logic::features::{FillValue, UnknownPolicy};
use accountguard_core::logic::model::{IsolationTree, RawPrediction};
use accountguard_core::{
    DetectionContext, FeatureSchema, FraudDetector, InferenceError, IsolationForest, ModelHandle,
    OneHotEncoder, Preprocessor, SequenceModel, SimpleImputer, TextClassifier, UrlClassifier,
};

use crate::config::Config;
use crate::{create_router, db, AppState};

// ============================================================================
// FIXTURES
// ============================================================================

struct FrozenModel {
    label: &'static str,
    score: f32,
}

impl SequenceModel for FrozenModel {
    fn name(&self) -> &str {
        "frozen"
    }

    fn predict(&self, _text: &str) -> Result<RawPrediction, InferenceError> {
        Ok(RawPrediction {
            label: self.label.to_string(),
            score: self.score,
            class_index: 1,
            inference_time_us: 1,
        })
    }
}

struct BrokenModel;

impl SequenceModel for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    fn predict(&self, _text: &str) -> Result<RawPrediction, InferenceError> {
        Err(InferenceError::Runtime("output tensor missing".to_string()))
    }
}

/// amount <= 500 lands in a crowded leaf, anything above is isolated at once
fn fraud_detector() -> FraudDetector {
    let schema = FeatureSchema::new(1, vec!["amount".into(), "channel".into()], vec!["channel".into()]).unwrap();
    let imputer = SimpleImputer::new(
        "most_frequent",
        vec![],
        vec![FillValue::Number(40.0), FillValue::Text("web".into())],
    );
    let encoder = OneHotEncoder::new(
        vec!["channel".into()],
        vec![vec!["app".into(), "web".into()]],
        UnknownPolicy::Ignore,
    )
    .unwrap();
    let preprocessor = Preprocessor::new(schema, imputer, encoder).unwrap();

    let tree = IsolationTree {
        features: vec![],
        children_left: vec![1, -1, -1],
        children_right: vec![2, -1, -1],
        feature: vec![0, -2, -2],
        threshold: vec![500.0, -2.0, -2.0],
        n_node_samples: vec![256, 255, 1],
    };
    let forest = IsolationForest::new(
        vec!["amount".into(), "channel_app".into(), "channel_web".into()],
        -0.5,
        256,
        vec![tree],
    )
    .unwrap();

    FraudDetector::new(preprocessor, Box::new(forest)).unwrap()
}

fn detection() -> DetectionContext {
    DetectionContext::new(
        UrlClassifier::new(ModelHandle::Ready(Box::new(FrozenModel {
            label: "LABEL_1",
            score: 0.95,
        }))),
        TextClassifier::new(ModelHandle::Ready(Box::new(FrozenModel {
            label: "phishing",
            score: 0.6,
        }))),
        ModelHandle::Ready(fraud_detector()),
    )
}

async fn app_with(detection: DetectionContext, with_store: bool) -> Router {
    let store = if with_store {
        let pool = db::create_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        Some(pool)
    } else {
        None
    };

    create_router(AppState {
        store,
        detection: Arc::new(detection),
        config: Config::default(),
    })
}

async fn app() -> Router {
    app_with(detection(), true).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_text(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// PHISHING
// ============================================================================

#[tokio::test]
async fn test_url_scan_is_logged_as_high_threat() {
    let app = app().await;

    let (status, body) = send(&app, post_json("/phishing/url", json!({"url": "http://secure-verify-bank.tk"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "url");
    assert_eq!(body["api_version"], "2.0.0");
    assert_eq!(body["result"]["label"], "phishing");
    let indicators = body["result"]["risk_indicators"].as_array().unwrap();
    assert!(indicators.contains(&json!("Suspicious keywords detected")));

    let (status, logs) = send(&app, get("/logs?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["query_limit"], 1);
    assert_eq!(logs["total_count"], 1);
    let entry = &logs["logs"][0];
    assert_eq!(entry["threat_level"], "high");
    assert_eq!(entry["input_type"], "url");
    assert_eq!(entry["prediction"], "phishing");
    assert_eq!(entry["scan_id"], body["scan_id"]);
}

#[tokio::test]
async fn test_text_scan_truncates_echo() {
    let app = app().await;
    let text = format!("URGENT: verify your password at http://evil.example {}", "x".repeat(200));

    let (status, body) = send(&app, post_text("/phishing/text", &text)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "text");
    let echoed = body["input"].as_str().unwrap();
    assert!(echoed.ends_with("..."));
    assert_eq!(echoed.chars().count(), 103);
    assert_eq!(body["result"]["text_length"], text.chars().count());

    let (_, logs) = send(&app, get("/logs?threat_level=medium")).await;
    let entry = &logs["logs"][0];
    assert_eq!(entry["threat_level"], "medium");
    assert_eq!(entry["content_length"], text.chars().count());
}

#[tokio::test]
async fn test_request_metadata_recorded() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/phishing/url")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .header("user-agent", "AccountGuard-Dashboard")
        .body(Body::from(json!({"url": "https://example.org"}).to_string()))
        .unwrap();
    send(&app, request).await;

    let (_, logs) = send(&app, get("/logs")).await;
    assert_eq!(logs["logs"][0]["source_ip"], "203.0.113.7");
    assert_eq!(logs["logs"][0]["user_agent"], "AccountGuard-Dashboard");
}

#[tokio::test]
async fn test_empty_url_rejected() {
    let app = app().await;
    let (status, body) = send(&app, post_json("/phishing/url", json!({"url": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_unavailable_model_degrades() {
    let detection = DetectionContext::new(
        UrlClassifier::new(ModelHandle::unavailable("model.onnx not found")),
        TextClassifier::new(ModelHandle::unavailable("model.onnx not found")),
        ModelHandle::unavailable("isolation_forest.json not found"),
    );
    let app = app_with(detection, true).await;

    let (status, body) = send(&app, post_json("/phishing/url", json!({"url": "https://bit.ly/abc"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["label"], "unknown");
    assert_eq!(body["result"]["score"], 0.0);
    assert_eq!(body["result"]["reason"], "Model not available");
    assert_eq!(body["result"]["risk_indicators"], json!(["URL shortener detected"]));

    let (status, body) = send(&app, post_json("/predict", json!({"data": {"amount": 10.0}}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["model"], "isolation-forest");
}

#[tokio::test]
async fn test_inference_failure_returns_error_verdict() {
    let detection = DetectionContext::new(
        UrlClassifier::new(ModelHandle::Ready(Box::new(BrokenModel))),
        TextClassifier::new(ModelHandle::Ready(Box::new(BrokenModel))),
        ModelHandle::Ready(fraud_detector()),
    );
    let app = app_with(detection, true).await;

    let (status, body) = send(&app, post_text("/phishing/text", "hello there")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["result"]["label"], "error");
    assert!(body["result"]["reason"]
        .as_str()
        .unwrap()
        .starts_with("Classification failed:"));
}

// ============================================================================
// FRAUD
// ============================================================================

#[tokio::test]
async fn test_predict_single_record() {
    let app = app().await;
    let (status, body) = send(
        &app,
        post_json("/predict", json!({"data": {"amount": 12.5, "channel": "app"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["anomaly_score"].as_array().unwrap().len(), 1);
    let prediction = body["prediction"].as_array().unwrap();
    assert_eq!(prediction.len(), 1);
    assert!(prediction[0] == json!(1) || prediction[0] == json!(-1));
}

#[tokio::test]
async fn test_predict_batch_keeps_order_and_logs() {
    let app = app().await;
    let (status, body) = send(
        &app,
        post_json(
            "/predict",
            json!({"data": [{"amount": 20.0}, {"amount": 9000.0, "channel": "atm"}, {}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!([1, -1, 1]));

    let (_, analytics) = send(&app, get("/analytics")).await;
    let analytics = &analytics["analytics"];
    assert_eq!(analytics["fraud_detected"], 1);
    assert_eq!(analytics["high_threats"], 1);
    assert_eq!(analytics["scan_distribution"]["transaction_scans"], 3);
}

#[tokio::test]
async fn test_predict_rejects_bad_payloads() {
    let app = app().await;

    let (status, _) = send(&app, post_json("/predict", json!({"data": "amount=5"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/predict", json!({"data": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_json("/predict", json!({"data": {"amount": {"value": 5}}}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "amount");

    let (status, body) = send(&app, post_json("/predict", json!({"data": {"amount": "lots"}}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "amount");
}

#[tokio::test]
async fn test_predict_ignores_nested_extra_keys() {
    let app = app().await;
    let (status, body) = send(
        &app,
        post_json(
            "/predict",
            json!({"data": {"amount": 12.5, "channel": "app", "meta": {"device": "x"}, "flag": true}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!([1]));

    let (status, body) = send(
        &app,
        post_json("/predict", json!({"data": {"amount": 1, "meta": {"tags": [1, 2]}, "flag": true}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["anomaly_score"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, post_json("/predict", json!({"data": {"channel": true}}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "channel");
}

// ============================================================================
// LOGS / ANALYTICS / HEALTH
// ============================================================================

#[tokio::test]
async fn test_empty_analytics() {
    let app = app().await;
    let (status, body) = send(&app, get("/analytics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analytics"]["total_scans"], 0);
    assert_eq!(body["analytics"]["detection_rate"], 0.0);
}

#[tokio::test]
async fn test_detection_rate_after_scans() {
    let app = app().await;
    send(&app, post_json("/phishing/url", json!({"url": "http://a.example"}))).await;
    send(&app, post_text("/phishing/text", "lunch tomorrow?")).await;
    send(&app, post_json("/predict", json!({"data": {"amount": 1.0}}))).await;

    let (_, body) = send(&app, get("/analytics")).await;
    assert_eq!(body["analytics"]["total_scans"], 3);
    assert_eq!(body["analytics"]["phishing_detected"], 2);
    assert_eq!(body["analytics"]["detection_rate"], 66.67);
    assert_eq!(body["analytics"]["recent_scans_24h"], 3);
}

#[tokio::test]
async fn test_invalid_threat_level_filter() {
    let app = app().await;
    let (status, _) = send(&app, get("/logs?threat_level=critical")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_unavailable() {
    let app = app_with(detection(), false).await;

    let (status, body) = send(&app, post_json("/phishing/url", json!({"url": "http://a.example"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["label"], "phishing");

    let (status, logs) = send(&app, get("/logs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["logs"], json!([]));
    assert_eq!(logs["message"], "Database not available");

    let (_, analytics) = send(&app, get("/analytics")).await;
    assert_eq!(analytics["analytics"], json!({}));
    assert_eq!(analytics["message"], "Database not available");
}

#[tokio::test]
async fn test_store_query_failure_degrades() {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let app = create_router(AppState {
        store: Some(pool.clone()),
        detection: Arc::new(detection()),
        config: Config::default(),
    });

    sqlx::query("DROP TABLE threat_logs").execute(&pool).await.unwrap();

    let (status, body) = send(&app, post_json("/phishing/url", json!({"url": "http://a.example"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["label"], "phishing");

    let (status, logs) = send(&app, get("/logs?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["logs"], json!([]));
    assert_eq!(logs["total_count"], 0);
    assert_eq!(logs["query_limit"], 5);
    assert_eq!(logs["message"], "Database not available");

    let (status, analytics) = send(&app, get("/analytics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["analytics"], json!({}));
    assert_eq!(analytics["message"], "Database not available");
}

#[tokio::test]
async fn test_health_reports_models_and_store() {
    let app = app().await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["schema_version"], 1);
    assert_eq!(body["models"].as_array().unwrap().len(), 3);
    assert_eq!(body["feature_layout"]["feature_count"], 2);

    let degraded = app_with(detection(), false).await;
    let (_, body) = send(&degraded, get("/health")).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_banner() {
    let (status, body) = send(&app().await, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["endpoints"]["predict"], "/predict");
}
