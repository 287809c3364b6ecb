//! Response DTOs
//!
//! JSON shapes returned by the HTTP API. Field names follow what the web
//! client already consumes (`_id`, `userId`, `createdAt`); ids are strings.

use serde::Serialize;

use crate::domain::{Identity, Message, User};

/// Body returned after register/login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: String,
}

impl From<&User> for AuthResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
        }
    }
}

/// Identity carried by the caller's token
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

impl From<Identity> for ProfileResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id.to_string(),
            username: identity.username,
        }
    }
}

/// Entry of the people directory
#[derive(Debug, Serialize)]
pub struct PersonResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
}

impl From<User> for PersonResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
        }
    }
}

/// Stored message as returned by history
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub text: Option<String>,
    pub file: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.to_string(),
            sender: message.sender_id.to_string(),
            recipient: message.recipient_id.to_string(),
            text: message.text,
            file: message.file,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}
