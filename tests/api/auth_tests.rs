//! Authentication API Tests

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{body_json, token_cookie, TestApp};

/// Test user registration with valid data
#[tokio::test]
async fn test_register_sets_cookie_and_returns_id() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/register", &json!({"username": "alice", "password": "pa55word"}))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("Path=/"));

    let body = body_json(response).await;
    assert!(body["id"].as_str().unwrap().parse::<i64>().is_ok());
}

#[tokio::test]
async fn test_register_taken_username_is_bad_request() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let response = app
        .post_json("/register", &json!({"username": "alice", "password": "another"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Username taken");
}

/// Test registration fails with short password
#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/register", &json!({"username": "alice", "password": "abc"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_returns_same_id() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let response = app
        .post_json("/login", &json!({"username": "alice", "password": "pa55word"}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(token_cookie(&response).is_some());
    assert_eq!(body_json(response).await["id"], alice.id);
}

/// Test login fails with wrong password
#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let wrong = app
        .post_json("/login", &json!({"username": "alice", "password": "nope-nope"}))
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = app
        .post_json("/login", &json!({"username": "nobody", "password": "pa55word"}))
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_from_cookie_or_bearer() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let expected = json!({"userId": alice.id, "username": "alice"});

    let response = app.get_with_cookie("/profile", &alice.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, expected);

    let response = app.get_auth("/profile", &alice.token).await;
    assert_eq!(body_json(response).await, expected);
}

/// Test accessing protected route without token fails
#[tokio::test]
async fn test_profile_without_token_is_unauthorized() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/profile").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get_auth("/profile", "not-a-token").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;

    let response = app.post_json("/logout", &json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(token_cookie(&response).as_deref(), Some(""));
    assert_eq!(body_json(response).await, json!("ok"));
}
