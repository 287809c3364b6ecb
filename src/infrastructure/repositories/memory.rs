//! In-Memory Repositories
//!
//! Process-local implementations of the storage traits. Used when no
//! database URL is configured, and by the test-suite.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{Message, MessageRepository, User, UserRepository};
use crate::shared::error::AppError;

/// Users kept in a vector behind a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.write();
        if users
            .iter()
            .any(|u| u.username == user.username || u.id == user.id)
        {
            return Err(AppError::Conflict("Username taken".to_string()));
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.users.read().clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.users.read().iter().any(|u| u.username == username))
    }
}

/// Append-only message log behind a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Copy of every stored message in insertion order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.read().clone()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let mut messages = self.messages.write();
        if messages.iter().any(|m| m.id == message.id) {
            return Err(AppError::Conflict(format!(
                "Message {} already exists",
                message.id
            )));
        }
        messages.push(message.clone());
        Ok(message.clone())
    }

    async fn find_between(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>, AppError> {
        let mut history: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|m| m.is_between(user_a, user_b))
            .cloned()
            .collect();
        history.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(history)
    }
}
