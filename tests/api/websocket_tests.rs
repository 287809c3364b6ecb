//! End-to-end WebSocket Tests
//!
//! Real listener, real clients: presence, delivery fan-out and history.

use axum::body::to_bytes;
use axum::http::StatusCode;
use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use crate::common::{body_json, next_frame_with, wait_for_online, ws_connect, TestApp};

#[tokio::test]
async fn test_presence_follows_connects_and_disconnects() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let addr = app.spawn().await;

    let mut alice_ws = ws_connect(addr, Some(alice.token.as_str())).await;
    let frame = wait_for_online(&mut alice_ws, &[&alice.id]).await;
    assert_eq!(
        frame,
        json!({"online": [{"userId": alice.id, "username": "alice"}]})
    );

    let mut bob_ws = ws_connect(addr, Some(bob.token.as_str())).await;
    wait_for_online(&mut alice_ws, &[&alice.id, &bob.id]).await;
    wait_for_online(&mut bob_ws, &[&alice.id, &bob.id]).await;

    bob_ws.close(None).await.unwrap();
    wait_for_online(&mut alice_ws, &[&alice.id]).await;
}

#[tokio::test]
async fn test_anonymous_connection_sees_presence_but_cannot_send() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let addr = app.spawn().await;

    let mut anon_ws = ws_connect(addr, None).await;
    wait_for_online::<&str>(&mut anon_ws, &[]).await;

    let _alice_ws = ws_connect(addr, Some(alice.token.as_str())).await;
    wait_for_online(&mut anon_ws, &[&alice.id]).await;

    anon_ws
        .send(Message::Text(
            json!({"recipient": alice.id, "text": "hi"}).to_string().into(),
        ))
        .await
        .unwrap();

    let error = next_frame_with(&mut anon_ws, "error").await;
    assert_eq!(error["error"]["code"], "unauthenticated");
}

#[tokio::test]
async fn test_message_reaches_every_recipient_device_and_history() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let carol = app.register("carol").await;
    let addr = app.spawn().await;

    let mut phone = ws_connect(addr, Some(alice.token.as_str())).await;
    let mut laptop = ws_connect(addr, Some(alice.token.as_str())).await;
    let mut bob_ws = ws_connect(addr, Some(bob.token.as_str())).await;
    let mut carol_ws = ws_connect(addr, Some(carol.token.as_str())).await;
    wait_for_online(&mut bob_ws, &[&alice.id, &bob.id, &carol.id]).await;

    bob_ws
        .send(Message::Text(
            json!({"recipient": alice.id, "text": "hi"}).to_string().into(),
        ))
        .await
        .unwrap();

    let ack = next_frame_with(&mut bob_ws, "ack").await;
    assert_eq!(ack["ack"]["delivered"], 2);
    let id = ack["ack"]["_id"].clone();

    for device in [&mut phone, &mut laptop] {
        let delivery = next_frame_with(device, "_id").await;
        assert_eq!(
            delivery,
            json!({"text": "hi", "sender": bob.id, "recipient": alice.id, "file": null, "_id": id})
        );
    }

    // carol sends herself a note so the next frame on her socket is known
    carol_ws
        .send(Message::Text(
            json!({"recipient": carol.id, "text": "note"}).to_string().into(),
        ))
        .await
        .unwrap();
    let delivery = next_frame_with(&mut carol_ws, "_id").await;
    assert_eq!(delivery["text"], "note");

    let response = app.get_auth(&format!("/messages/{}", bob.id), &alice.token).await;
    let history = body_json(response).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["_id"], id);
    assert_eq!(history[0]["text"], "hi");
}

#[tokio::test]
async fn test_invalid_message_is_rejected_and_not_stored() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let addr = app.spawn().await;

    let mut alice_ws = ws_connect(addr, Some(alice.token.as_str())).await;
    alice_ws
        .send(Message::Text(json!({"recipient": bob.id}).to_string().into()))
        .await
        .unwrap();

    let error = next_frame_with(&mut alice_ws, "error").await;
    assert_eq!(error["error"]["code"], "invalid_message");

    let response = app.get_auth(&format!("/messages/{}", bob.id), &alice.token).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_attachment_is_stored_and_served() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let addr = app.spawn().await;

    let mut alice_ws = ws_connect(addr, Some(alice.token.as_str())).await;
    let mut bob_ws = ws_connect(addr, Some(bob.token.as_str())).await;
    wait_for_online(&mut alice_ws, &[&alice.id, &bob.id]).await;

    alice_ws
        .send(Message::Text(
            json!({
                "recipient": bob.id,
                "file": {"name": "notes.txt", "data": "data:text/plain;base64,aGVsbG8gYm9i"}
            })
            .to_string()
            .into(),
        ))
        .await
        .unwrap();

    let delivery = next_frame_with(&mut bob_ws, "_id").await;
    assert_eq!(delivery["text"], serde_json::Value::Null);
    let filename = delivery["file"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".txt"));

    let on_disk = std::fs::read(app.uploads.path().join(&filename)).unwrap();
    assert_eq!(on_disk, b"hello bob");

    let response = app.get(&format!("/uploads/{}", filename)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello bob");
}
