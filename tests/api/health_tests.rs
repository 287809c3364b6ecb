//! Health and Operations Endpoint Tests

use axum::body::to_bytes;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{body_json, TestApp};

/// Test health check endpoint returns OK
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let app = TestApp::new().await;

    let response = app.get("/health/live").await;

    assert_eq!(body_json(response).await, json!({"status": "alive"}));
}

#[tokio::test]
async fn test_readiness_with_in_memory_store() {
    let app = TestApp::new().await;

    let response = app.get("/health/ready").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["store"]["backend"], "memory");
    assert_eq!(body["checks"]["gateway"]["connections"], 0);
    assert_eq!(body["checks"]["gateway"]["online_users"], 0);
}

#[tokio::test]
async fn test_smoke_endpoint() {
    let app = TestApp::new().await;

    let response = app.get("/test").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!("Test ok"));
}

#[tokio::test]
async fn test_metrics_exposition() {
    let app = TestApp::new().await;

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("direct_chat_"));
}
