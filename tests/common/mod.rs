//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, Message},
    MaybeTlsStream, WebSocketStream,
};
use tower::ServiceExt;

use direct_chat::config::{
    CorsSettings, DatabaseSettings, JwtSettings, ServerSettings, Settings, SnowflakeSettings,
    UploadSettings, WebSocketSettings,
};
use direct_chat::startup::{build_router, AppState, Backends};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Test application backed by in-memory stores and a temporary upload dir
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

/// A registered user
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

pub fn test_settings(uploads_dir: &str) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: None,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: 5,
        },
        jwt: JwtSettings {
            secret: "test-secret-that-is-at-least-32-characters".into(),
            token_expiry_minutes: 60,
            cookie_secure: false,
        },
        snowflake: SnowflakeSettings {
            machine_id: 1,
            epoch: direct_chat::shared::snowflake::DEFAULT_EPOCH,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        websocket: WebSocketSettings {
            max_message_size: 1 << 20,
            max_frame_size: 1 << 20,
            heartbeat_interval_ms: 5000,
            pong_timeout_ms: 1000,
        },
        uploads: UploadSettings {
            dir: uploads_dir.into(),
            max_file_size: 64 * 1024,
        },
        environment: "test".into(),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = TempDir::new().expect("temp dir");
        let settings = test_settings(uploads.path().to_str().expect("utf-8 temp path"));
        let state = AppState::new(settings, Backends::in_memory());
        let router = build_router(state.clone());

        Self {
            router,
            state,
            uploads,
        }
    }

    /// Serve the router on an ephemeral port for WebSocket clients
    pub async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a GET request carrying the token cookie
    pub async fn get_with_cookie(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::COOKIE, format!("token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Register `username` and return its id and token
    pub async fn register(&self, username: &str) -> TestUser {
        let response = self
            .post_json(
                "/register",
                &json!({"username": username, "password": "pa55word"}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let token = token_cookie(&response).expect("token cookie");
        let body = body_json(response).await;

        TestUser {
            id: body["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            token,
        }
    }
}

/// Value of the `token` cookie set by a response
pub fn token_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            cookie
                .split(';')
                .next()
                .and_then(|pair| pair.trim().strip_prefix("token="))
                .map(str::to_string)
        })
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Open a WebSocket, authenticated when `token` is given
pub async fn ws_connect(addr: SocketAddr, token: Option<&str>) -> WsClient {
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    if let Some(token) = token {
        request
            .headers_mut()
            .insert(header::COOKIE, format!("token={}", token).parse().unwrap());
    }
    let (stream, _) = connect_async(request).await.unwrap();
    stream
}

/// Next JSON text frame that has `key` at the top level
pub async fn next_frame_with(ws: &mut WsClient, key: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(message) = ws.next().await {
            if let Message::Text(text) = message.unwrap() {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                if value.get(key).is_some() {
                    return value;
                }
            }
        }
        panic!("socket closed while waiting for a {:?} frame", key);
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for a {:?} frame", key))
}

/// Wait for a presence frame listing exactly `user_ids`
pub async fn wait_for_online<S: AsRef<str>>(ws: &mut WsClient, user_ids: &[S]) -> Value {
    loop {
        let frame = next_frame_with(ws, "online").await;
        let mut online: Vec<&str> = frame["online"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["userId"].as_str().unwrap())
            .collect();
        online.sort_unstable();
        let mut expected: Vec<&str> = user_ids.iter().map(AsRef::as_ref).collect();
        expected.sort_unstable();
        if online == expected {
            return frame;
        }
    }
}
