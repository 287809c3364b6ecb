//! File attachment entity and content store trait.
//!
//! Attachments arrive inline in a WebSocket frame as base64 text. They are
//! decoded, written to the content store under a generated name, and the
//! message records only that name.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use uuid::Uuid;

use crate::shared::error::AppError;

/// Extension used when the original name has none we can keep.
pub const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 16;

/// A decoded attachment waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename as the client sent it
    pub original_name: String,

    /// Decoded content
    pub bytes: Vec<u8>,
}

/// Errors decoding an inline attachment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("attachment data is not valid base64")]
    InvalidEncoding,

    #[error("attachment is {size} bytes, the limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

impl Attachment {
    /// Decode the `data` field of an inbound file.
    ///
    /// Browsers send `data:<mime>;base64,<payload>` URLs; anything before the
    /// first comma is ignored. Plain base64 is accepted as well.
    pub fn decode(name: &str, data: &str, limit: usize) -> Result<Self, AttachmentError> {
        let payload = data.split_once(',').map(|(_, rest)| rest).unwrap_or(data);

        // base64 expands 3 bytes into 4 chars, reject before allocating
        let estimated = payload.len() / 4 * 3;
        if estimated > limit + 2 {
            return Err(AttachmentError::TooLarge {
                size: estimated,
                limit,
            });
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| AttachmentError::InvalidEncoding)?;

        if bytes.len() > limit {
            return Err(AttachmentError::TooLarge {
                size: bytes.len(),
                limit,
            });
        }

        Ok(Self {
            original_name: name.to_string(),
            bytes,
        })
    }

    /// Lowercased extension of the original name, restricted to ASCII
    /// alphanumerics so it is safe inside a path.
    pub fn extension(&self) -> &str {
        match self.original_name.rsplit_once('.') {
            Some((_, ext))
                if !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LEN
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                ext
            }
            _ => FALLBACK_EXTENSION,
        }
    }

    /// Unique storage name: millisecond timestamp, a random suffix, and the
    /// original extension.
    pub fn generate_filename(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            &suffix[..8],
            self.extension().to_ascii_lowercase()
        )
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Content store for attachment bytes.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist `bytes` under `filename`. The name is generated by
    /// [`Attachment::generate_filename`] and never comes from a client.
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError>;
}
