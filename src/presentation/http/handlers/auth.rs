//! Authentication Handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::application::dto::request::CredentialsRequest;
use crate::application::dto::response::{AuthResponse, ProfileResponse};
use crate::application::services::{AuthService, AuthServiceImpl};
use crate::presentation::http::extractors::AuthUser;
use crate::presentation::middleware::auth::TOKEN_COOKIE;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn auth_service(state: &AppState) -> impl AuthService {
    AuthServiceImpl::new(state.users.clone(), state.snowflake.clone(), state.jwt.clone())
}

/// Cookie carrying the identity token. Browsers only send `SameSite=None`
/// cookies over HTTPS, so insecure deployments fall back to `Lax`.
fn token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .build()
}

/// Register a new user and sign them in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let session = auth_service(&state)
        .register(&body.username, &body.password)
        .await?;

    let jar = jar.add(token_cookie(session.token, state.settings.jwt.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(AuthResponse::from(&session.user))))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let session = auth_service(&state)
        .authenticate(&body.username, &body.password)
        .await?;

    tracing::info!(user_id = session.user.id, "User logged in");

    let jar = jar.add(token_cookie(session.token, state.settings.jwt.cookie_secure));
    Ok((jar, Json(AuthResponse::from(&session.user))))
}

/// Clear the token cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<&'static str>) {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (jar, Json("ok"))
}

/// Identity carried by the caller's token
pub async fn profile(AuthUser(identity): AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(identity))
}
