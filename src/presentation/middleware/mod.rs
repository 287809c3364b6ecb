//! Middleware
//!
//! Tower middleware and request authentication helpers.

pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::{identity_from_headers, token_from_headers, TOKEN_COOKIE};
