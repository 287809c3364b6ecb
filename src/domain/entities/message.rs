//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A direct message between two users.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - sender_id: BIGINT NOT NULL
/// - recipient_id: BIGINT NOT NULL
/// - text: TEXT NULL
/// - file: TEXT NULL (generated attachment filename)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// At least one of `text` and `file` is always present. Messages are never
/// modified once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Author user ID
    pub sender_id: i64,

    /// Recipient user ID
    pub recipient_id: i64,

    /// Message text
    pub text: Option<String>,

    /// Stored attachment filename
    pub file: Option<String>,

    /// Timestamp when message was sent
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the message belongs to the conversation between `a` and `b`.
    pub fn is_between(&self, a: i64, b: i64) -> bool {
        (self.sender_id == a && self.recipient_id == b)
            || (self.sender_id == b && self.recipient_id == a)
    }

    /// Check if this message carries an attachment.
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Conversation history between two users, oldest first.
    ///
    /// Ties on `created_at` are broken by id so the order is total.
    async fn find_between(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>, AppError>;
}
