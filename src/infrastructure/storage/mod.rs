//! Attachment Content Storage
//!
//! Writes decoded attachments to a local directory that the HTTP layer
//! serves under `/uploads`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::AttachmentStore;
use crate::shared::error::AppError;

/// Attachment store rooted at a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory files are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, AppError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(filename)),
            _ => Err(AppError::BadRequest(format!(
                "Invalid attachment filename: {filename}"
            ))),
        }
    }
}

#[async_trait]
impl AttachmentStore for LocalFileStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.path_for(filename)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Attachment stored");
        Ok(())
    }
}
