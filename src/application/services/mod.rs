//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, password checks, identity tokens
//! - **UserService**: Directory of registered users
//! - **MessageService**: Conversation history

pub mod auth_service;
pub mod message_service;
pub mod user_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl, AuthSession, Claims, JwtCodec};
pub use message_service::{MessageError, MessageService, MessageServiceImpl};
pub use user_service::{UserError, UserService, UserServiceImpl};
