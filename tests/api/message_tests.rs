//! People and History API Tests

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::Value;

use direct_chat::domain::{Message, MessageRepository};

use crate::common::{body_json, TestApp};

#[tokio::test]
async fn test_people_lists_every_user_by_name() {
    let app = TestApp::new().await;
    let carol = app.register("carol").await;
    let alice = app.register("alice").await;

    let response = app.get("/people").await;

    assert_eq!(response.status(), StatusCode::OK);
    let people = body_json(response).await;
    let listed: Vec<(&str, &str)> = people
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["_id"].as_str().unwrap(), p["username"].as_str().unwrap()))
        .collect();
    assert_eq!(
        listed,
        vec![(alice.id.as_str(), "alice"), (carol.id.as_str(), "carol")]
    );
}

#[tokio::test]
async fn test_history_requires_token() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/messages/1").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_history_rejects_bad_user_id() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let response = app.get_auth("/messages/not-a-number", &alice.token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_is_exact_pair_in_creation_order() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let carol = app.register("carol").await;

    let (a, b, c): (i64, i64, i64) = (
        alice.id.parse().unwrap(),
        bob.id.parse().unwrap(),
        carol.id.parse().unwrap(),
    );
    let base = Utc::now();

    // interleaved with traffic from other pairs
    let rows = [
        (1, a, b, "one"),
        (2, a, c, "noise"),
        (3, b, a, "two"),
        (4, c, b, "noise"),
        (5, a, b, "three"),
    ];
    for (offset, sender, recipient, text) in rows {
        app.state
            .messages
            .create(&Message {
                id: offset,
                sender_id: sender,
                recipient_id: recipient,
                text: Some(text.into()),
                file: None,
                created_at: base + Duration::milliseconds(offset),
            })
            .await
            .unwrap();
    }

    let response = app.get_auth(&format!("/messages/{}", bob.id), &alice.token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let history = body_json(response).await;
    let texts: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);

    let first: &Value = &history[0];
    assert_eq!(first["sender"], alice.id);
    assert_eq!(first["recipient"], bob.id);
    assert_eq!(first["file"], Value::Null);

    // same conversation seen from the other side
    let response = app.get_auth(&format!("/messages/{}", alice.id), &bob.token).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
}
