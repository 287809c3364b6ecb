//! User Service
//!
//! Directory of registered users.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{User, UserRepository};

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Every registered user, ordered by username
    async fn list_people(&self) -> Result<Vec<User>, UserError>;
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Internal error: {0}")]
    Internal(String),
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    user_repo: Arc<U>,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn list_people(&self) -> Result<Vec<User>, UserError> {
        self.user_repo
            .list()
            .await
            .map_err(|e| UserError::Internal(e.to_string()))
    }
}
