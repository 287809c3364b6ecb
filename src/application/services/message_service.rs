//! Message Service
//!
//! Conversation history lookups. Sending happens over the WebSocket gateway.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Message, MessageRepository};

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Every message exchanged between `viewer_id` and `peer_id`, oldest first
    async fn history(&self, viewer_id: i64, peer_id: i64) -> Result<Vec<Message>, MessageError>;
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Internal error: {0}")]
    Internal(String),
}

/// MessageService implementation
pub struct MessageServiceImpl<M>
where
    M: MessageRepository + ?Sized,
{
    message_repo: Arc<M>,
}

impl<M> MessageServiceImpl<M>
where
    M: MessageRepository + ?Sized,
{
    pub fn new(message_repo: Arc<M>) -> Self {
        Self { message_repo }
    }
}

#[async_trait]
impl<M> MessageService for MessageServiceImpl<M>
where
    M: MessageRepository + ?Sized + 'static,
{
    async fn history(&self, viewer_id: i64, peer_id: i64) -> Result<Vec<Message>, MessageError> {
        self.message_repo
            .find_between(viewer_id, peer_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))
    }
}
