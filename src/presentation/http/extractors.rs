//! Custom Extractors
//!
//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::domain::Identity;
use crate::presentation::middleware::auth::identity_from_headers;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extracted from the identity token
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers, &state.jwt)
            .map(AuthUser)
            .map_err(AppError::from)
    }
}
