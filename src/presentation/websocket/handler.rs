//! WebSocket Connection Handler
//!
//! Resolves the caller's identity during the upgrade handshake and hands
//! the socket to a session.

use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use futures::StreamExt;

use crate::domain::Identity;
use crate::presentation::middleware::auth::identity_from_headers;
use crate::startup::AppState;

use super::session::run_session;

/// WebSocket upgrade handler
///
/// A missing or invalid token still upgrades; the connection is anonymous
/// and only receives presence.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let identity = match identity_from_headers(&headers, &state.jwt) {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::debug!(error = %e, "WebSocket handshake without a valid token");
            None
        }
    };

    let max_message_size = state.settings.websocket.max_message_size;
    let max_frame_size = state.settings.websocket.max_frame_size;

    ws.max_message_size(max_message_size)
        .max_frame_size(max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, identity: Option<Identity>) {
    // Split socket for concurrent read/write
    let (sender, receiver) = socket.split();
    run_session(state.gateway.clone(), identity, receiver, sender).await;
}
