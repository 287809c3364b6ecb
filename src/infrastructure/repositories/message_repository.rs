//! Message Repository Implementation
//!
//! PostgreSQL implementation of direct message storage and history lookup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Message, MessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    recipient_id: i64,
    text: Option<String>,
    file: Option<String>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            text: self.text,
            file: self.file,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, text, file, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sender_id, recipient_id, text, file, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(&message.text)
        .bind(&message.file)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Both directions of the conversation, matched through the
    /// (LEAST, GREATEST) pair index.
    async fn find_between(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, recipient_id, text, file, created_at
            FROM messages
            WHERE LEAST(sender_id, recipient_id) = LEAST($1::BIGINT, $2::BIGINT)
              AND GREATEST(sender_id, recipient_id) = GREATEST($1::BIGINT, $2::BIGINT)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }
}
