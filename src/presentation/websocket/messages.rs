//! WebSocket Message Types
//!
//! Wire frames exchanged with clients. Inbound frames are parsed leniently
//! and then validated into an [`OutgoingMessage`].

use serde::{Deserialize, Serialize};

use crate::domain::{Identity, Message};

/// Frame sent by a client to post a message
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file: Option<FilePayload>,
}

/// Embedded attachment: original name and base64 (optionally data-URL) content
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilePayload {
    pub name: String,
    pub data: String,
}

/// Body of a validated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    Text(String),
    File(FilePayload),
    TextAndFile { text: String, file: FilePayload },
}

impl MessagePayload {
    pub fn text(&self) -> Option<&str> {
        match self {
            MessagePayload::Text(text) | MessagePayload::TextAndFile { text, .. } => Some(text),
            MessagePayload::File(_) => None,
        }
    }

    pub fn file(&self) -> Option<&FilePayload> {
        match self {
            MessagePayload::File(file) | MessagePayload::TextAndFile { file, .. } => Some(file),
            MessagePayload::Text(_) => None,
        }
    }
}

/// A frame that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient: i64,
    pub payload: MessagePayload,
}

/// Why an inbound frame was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("recipient is required")]
    MissingRecipient,

    #[error("recipient must be a user id")]
    InvalidRecipient,

    #[error("message needs text or a file")]
    EmptyMessage,

    #[error("file name is required")]
    MissingFileName,
}

impl InboundFrame {
    /// Check the frame has a recipient and at least one of text/file
    pub fn validate(self) -> Result<OutgoingMessage, FrameError> {
        let recipient = self
            .recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(FrameError::MissingRecipient)?
            .parse::<i64>()
            .map_err(|_| FrameError::InvalidRecipient)?;

        let text = self.text.filter(|t| !t.is_empty());
        if let Some(file) = &self.file {
            if file.name.trim().is_empty() {
                return Err(FrameError::MissingFileName);
            }
        }

        let payload = match (text, self.file) {
            (Some(text), Some(file)) => MessagePayload::TextAndFile { text, file },
            (Some(text), None) => MessagePayload::Text(text),
            (None, Some(file)) => MessagePayload::File(file),
            (None, None) => return Err(FrameError::EmptyMessage),
        };

        Ok(OutgoingMessage { recipient, payload })
    }
}

/// `{ online: [...] }` snapshot pushed on every membership change
#[derive(Debug, Clone, Serialize)]
pub struct PresenceFrame {
    pub online: Vec<OnlinePerson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnlinePerson {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

impl From<&Identity> for OnlinePerson {
    fn from(identity: &Identity) -> Self {
        Self {
            user_id: identity.user_id.to_string(),
            username: identity.username.clone(),
        }
    }
}

/// Message forwarded to the recipient's connections
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryFrame {
    pub text: Option<String>,
    pub sender: String,
    pub recipient: String,
    pub file: Option<String>,
    #[serde(rename = "_id")]
    pub id: String,
}

impl From<&Message> for DeliveryFrame {
    fn from(message: &Message) -> Self {
        Self {
            text: message.text.clone(),
            sender: message.sender_id.to_string(),
            recipient: message.recipient_id.to_string(),
            file: message.file.clone(),
            id: message.id.to_string(),
        }
    }
}

/// Sent back to the sender when a frame could not be routed
#[derive(Debug, Clone, Serialize)]
pub struct ErrorFrame {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ErrorFrame {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }
}

/// Sent back to the sender once the message is persisted
#[derive(Debug, Clone, Serialize)]
pub struct AckFrame {
    pub ack: AckBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct AckBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub recipient: String,
    /// Number of recipient connections the delivery frame was queued on
    pub delivered: usize,
}
