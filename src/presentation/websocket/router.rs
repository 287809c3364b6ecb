//! Message Router
//!
//! Turns one inbound text frame into a stored message and forwards it to
//! every live connection of the recipient.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Attachment, AttachmentError, AttachmentStore, Message, MessageRepository};
use crate::shared::snowflake::SnowflakeGenerator;

use super::messages::{AckBody, AckFrame, DeliveryFrame, ErrorFrame, FrameError, InboundFrame};
use super::registry::{ConnectionHandle, ConnectionRegistry};

/// Why a frame was not routed
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("sign in to send messages")]
    Unauthenticated,

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("{0}")]
    Invalid(#[from] FrameError),

    #[error("attachment is {size} bytes, the limit is {limit}")]
    AttachmentTooLarge { size: usize, limit: usize },

    #[error("attachment data is not valid base64")]
    InvalidAttachment,

    #[error("could not store attachment")]
    Storage(String),

    #[error("could not save message")]
    Persistence(String),
}

impl RouteError {
    /// Code carried in the error frame
    pub fn code(&self) -> &'static str {
        match self {
            RouteError::Unauthenticated => "unauthenticated",
            RouteError::Malformed(_) => "malformed",
            RouteError::Invalid(_) | RouteError::InvalidAttachment => "invalid_message",
            RouteError::AttachmentTooLarge { .. } => "attachment_too_large",
            RouteError::Storage(_) => "storage_failed",
            RouteError::Persistence(_) => "persistence_failed",
        }
    }

    pub fn to_frame(&self) -> ErrorFrame {
        ErrorFrame::new(self.code(), self.to_string())
    }
}

impl From<AttachmentError> for RouteError {
    fn from(e: AttachmentError) -> Self {
        match e {
            AttachmentError::InvalidEncoding => RouteError::InvalidAttachment,
            AttachmentError::TooLarge { size, limit } => {
                RouteError::AttachmentTooLarge { size, limit }
            }
        }
    }
}

/// Outcome of a routed message
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub message: Message,
    /// Recipient connections the delivery frame was queued on
    pub delivered: usize,
}

impl DeliveryReceipt {
    pub fn to_ack(&self) -> AckFrame {
        AckFrame {
            ack: AckBody {
                id: self.message.id.to_string(),
                recipient: self.message.recipient_id.to_string(),
                delivered: self.delivered,
            },
        }
    }
}

pub struct MessageRouter {
    messages: Arc<dyn MessageRepository>,
    attachments: Arc<dyn AttachmentStore>,
    registry: Arc<ConnectionRegistry>,
    ids: Arc<SnowflakeGenerator>,
    max_attachment_bytes: usize,
}

impl MessageRouter {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        attachments: Arc<dyn AttachmentStore>,
        registry: Arc<ConnectionRegistry>,
        ids: Arc<SnowflakeGenerator>,
        max_attachment_bytes: usize,
    ) -> Self {
        Self {
            messages,
            attachments,
            registry,
            ids,
            max_attachment_bytes,
        }
    }

    /// Route one text frame sent on `sender`
    pub async fn route(
        &self,
        sender: &ConnectionHandle,
        raw: &str,
    ) -> Result<DeliveryReceipt, RouteError> {
        let identity = sender.identity().ok_or(RouteError::Unauthenticated)?;

        let frame: InboundFrame =
            serde_json::from_str(raw).map_err(|e| RouteError::Malformed(e.to_string()))?;
        let outgoing = frame.validate()?;

        // Validated first so a rejected frame never leaves a file behind
        let file = match outgoing.payload.file() {
            Some(payload) => {
                let attachment =
                    Attachment::decode(&payload.name, &payload.data, self.max_attachment_bytes)?;
                let filename = attachment.generate_filename();
                self.attachments
                    .put(&filename, &attachment.bytes)
                    .await
                    .map_err(|e| RouteError::Storage(e.to_string()))?;
                tracing::debug!(
                    connection_id = %sender.id(),
                    filename = %filename,
                    size = attachment.size(),
                    "Attachment stored"
                );
                Some(filename)
            }
            None => None,
        };

        let message = Message {
            id: self.ids.generate(),
            sender_id: identity.user_id,
            recipient_id: outgoing.recipient,
            text: outgoing.payload.text().map(str::to_owned),
            file,
            created_at: Utc::now(),
        };

        let message = self
            .messages
            .create(&message)
            .await
            .map_err(|e| RouteError::Persistence(e.to_string()))?;

        let delivered = self.forward(&message);

        tracing::debug!(
            message_id = message.id,
            sender_id = message.sender_id,
            recipient_id = message.recipient_id,
            has_file = message.has_file(),
            delivered = delivered,
            "Message routed"
        );

        Ok(DeliveryReceipt { message, delivered })
    }

    /// Push the delivery frame to every connection of the recipient
    fn forward(&self, message: &Message) -> usize {
        if !self.registry.is_user_online(message.recipient_id) {
            return 0;
        }
        let frame = DeliveryFrame::from(message);
        self.registry
            .by_user(message.recipient_id)
            .iter()
            .filter(|c| c.send_frame(&frame))
            .count()
    }
}
