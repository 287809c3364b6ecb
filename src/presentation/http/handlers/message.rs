//! Message Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::dto::response::MessageResponse;
use crate::application::services::{MessageService, MessageServiceImpl};
use crate::presentation::http::extractors::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Conversation between the caller and `user_id`, oldest first
pub async fn history(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let peer_id: i64 = user_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))?;

    let message_service = MessageServiceImpl::new(state.messages.clone());

    let messages = message_service
        .history(identity.user_id, peer_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}
