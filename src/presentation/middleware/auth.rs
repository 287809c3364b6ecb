//! Token Authentication
//!
//! Locates the identity token on a request (the `token` cookie, then an
//! `Authorization: Bearer` header) and verifies it.

use axum::http::HeaderMap;
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};

use crate::application::services::{AuthError, JwtCodec};
use crate::domain::Identity;

/// Name of the cookie carrying the identity token
pub const TOKEN_COOKIE: &str = "token";

/// Raw token from the cookie or the Authorization header
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = CookieJar::from_headers(headers).get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
}

/// Verify the request's token and return the identity it carries
pub fn identity_from_headers(headers: &HeaderMap, jwt: &JwtCodec) -> Result<Identity, AuthError> {
    let token = token_from_headers(headers).ok_or(AuthError::MissingToken)?;
    jwt.verify(&token)
}
