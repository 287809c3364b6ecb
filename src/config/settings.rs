//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL, optional)
    pub database: DatabaseSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// WebSocket configuration
    pub websocket: WebSocketSettings,

    /// Attachment upload configuration
    pub uploads: UploadSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
///
/// When `url` is absent the server keeps users and messages in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens
    pub secret: String,

    /// Token expiry in minutes
    pub token_expiry_minutes: i64,

    /// Whether the `token` cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes. Attachments travel inline as base64,
    /// so this bounds the largest file a client can send.
    pub max_message_size: usize,

    /// Maximum frame size in bytes
    pub max_frame_size: usize,

    /// Interval between server pings in milliseconds (default: 5000)
    pub heartbeat_interval_ms: u64,

    /// How long a ping may stay unanswered in milliseconds (default: 1000)
    pub pong_timeout_ms: u64,
}

/// Attachment storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Directory the decoded attachments are written to and served from
    pub dir: String,

    /// Largest decoded attachment accepted, in bytes
    pub max_file_size: usize,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the loaded values fail [`Settings::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        // plain PORT is honored as well
        let port = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok();

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4040)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("jwt.token_expiry_minutes", 60 * 24 * 7)?
            .set_default("jwt.cookie_secure", true)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", crate::shared::snowflake::DEFAULT_EPOCH)?
            .set_default("cors.allowed_origins", vec!["http://localhost:5173"])?
            .set_default("websocket.max_message_size", 8_388_608_i64)? // 8MB
            .set_default("websocket.max_frame_size", 8_388_608_i64)?
            .set_default("websocket.heartbeat_interval_ms", 5000_i64)?
            .set_default("websocket.pong_timeout_ms", 1000_i64)?
            .set_default("uploads.dir", "uploads")?
            .set_default("uploads.max_file_size", 5_242_880_i64)? // 5MB
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=4040 -> server.port = 4040
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", port)?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("uploads.dir", std::env::var("UPLOADS_DIR").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters for security. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }

        if self.websocket.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Message(
                "websocket.heartbeat_interval_ms must be greater than zero".into(),
            ));
        }

        if self.websocket.pong_timeout_ms == 0
            || self.websocket.pong_timeout_ms >= self.websocket.heartbeat_interval_ms
        {
            return Err(ConfigError::Message(format!(
                "websocket.pong_timeout_ms ({}) must be non-zero and shorter than websocket.heartbeat_interval_ms ({})",
                self.websocket.pong_timeout_ms, self.websocket.heartbeat_interval_ms
            )));
        }

        if self.uploads.max_file_size == 0 {
            return Err(ConfigError::Message(
                "uploads.max_file_size must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseSettings {
    /// The configured connection URL, ignoring blank values.
    pub fn connection_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

impl WebSocketSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }
}
