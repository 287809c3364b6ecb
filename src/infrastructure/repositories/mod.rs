//! Repository Implementations
//!
//! Implementations of the domain storage traits.
//!
//! - **PgUserRepository** / **PgMessageRepository**: PostgreSQL via sqlx
//! - **InMemoryUserRepository** / **InMemoryMessageRepository**: process-local,
//!   selected when no database URL is configured
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use direct_chat::infrastructure::repositories::{PgMessageRepository, PgUserRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let message_repo = PgMessageRepository::new(pool);
//! }
//! ```

pub mod memory;
pub mod message_repository;
pub mod user_repository;

pub use memory::{InMemoryMessageRepository, InMemoryUserRepository};
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
