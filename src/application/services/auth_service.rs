//! Authentication Service
//!
//! Registration, credential checks, and identity token issue/verification.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::domain::{Identity, User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and sign them in
    async fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Authenticate user with credentials
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<AuthSession, AuthError>;

    /// Validate a token and extract the identity it carries
    fn verify_token(&self, token: &str) -> Result<Identity, AuthError>;
}

/// A signed-in user and the token that proves it
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing token")]
    MissingToken,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid username or password".into())
            }
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
            AuthError::MissingToken => AppError::Unauthorized("No token!".into()),
            AuthError::UsernameExists => AppError::BadRequest("Username taken".into()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Signs and verifies identity tokens (HS256).
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

impl JwtCodec {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            expiry_minutes: settings.token_expiry_minutes,
        }
    }

    /// Sign a token for `identity`
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            exp: (now + Duration::minutes(self.expiry_minutes)).timestamp(),
            iat: now.timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Check signature and expiry, then trust the claims
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        let user_id = token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(Identity::new(user_id, token_data.claims.username))
    }
}

/// AuthService implementation
pub struct AuthServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    user_repo: Arc<U>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt: Arc<JwtCodec>,
}

impl<U> AuthServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    /// Create a new AuthServiceImpl
    pub fn new(user_repo: Arc<U>, id_generator: Arc<SnowflakeGenerator>, jwt: Arc<JwtCodec>) -> Self {
        Self {
            user_repo,
            id_generator,
            jwt,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.jwt.issue(&user.identity())?;
        Ok(AuthSession { user, token })
    }
}

#[async_trait]
impl<U> AuthService for AuthServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        if self
            .user_repo
            .username_exists(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::UsernameExists);
        }

        let password_hash = self.hash_password(password)?;

        let now = Utc::now();
        let user = User {
            id: self.id_generator.generate(),
            username: username.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        };

        // A concurrent registration can still win the race to the insert
        let created_user = self.user_repo.create(&user).await.map_err(|e| match e {
            AppError::Conflict(_) => AuthError::UsernameExists,
            e => AuthError::Internal(e.to_string()),
        })?;

        tracing::info!(user_id = created_user.id, username = %created_user.username, "User registered");

        self.session_for(created_user)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.session_for(user)
    }

    fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.jwt.verify(token)
    }
}
