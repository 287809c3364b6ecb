//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::JwtCodec;
use crate::config::{DatabaseSettings, Settings};
use crate::domain::{MessageRepository, UserRepository};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    InMemoryMessageRepository, InMemoryUserRepository, PgMessageRepository, PgUserRepository,
};
use crate::infrastructure::storage::LocalFileStore;
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::{ConnectionRegistry, Gateway, LivenessConfig, MessageRouter};
use crate::shared::snowflake::SnowflakeGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub messages: Arc<dyn MessageRepository>,
    /// Present when running against PostgreSQL
    pub db: Option<PgPool>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub jwt: Arc<JwtCodec>,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

/// User and message stores behind the application
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub db: Option<PgPool>,
}

impl Backends {
    /// Process-local stores, lost on restart
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            db: None,
        }
    }

    /// PostgreSQL when a URL is configured, in-memory otherwise
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let Some(url) = settings.connection_url() else {
            tracing::warn!("No database URL configured, using in-memory stores");
            return Ok(Self::in_memory());
        };

        let pool = database::create_pool(url, settings).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            db: Some(pool),
        })
    }
}

impl AppState {
    /// Wire the gateway and shared services on top of `backends`
    pub fn new(settings: Settings, backends: Backends) -> Self {
        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id,
            settings.snowflake.epoch,
        ));
        let jwt = Arc::new(JwtCodec::new(&settings.jwt));

        // Create WebSocket gateway
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(MessageRouter::new(
            backends.messages.clone(),
            Arc::new(LocalFileStore::new(&settings.uploads.dir)),
            Arc::clone(&registry),
            Arc::clone(&snowflake),
            settings.uploads.max_file_size,
        ));
        let gateway = Arc::new(Gateway::new(
            registry,
            router,
            LivenessConfig::from(&settings.websocket),
        ));

        Self {
            users: backends.users,
            messages: backends.messages,
            db: backends.db,
            snowflake,
            jwt,
            gateway,
            settings: Arc::new(settings),
        }
    }
}

/// Full router with tracing and CORS layers
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let backends = Backends::connect(&settings.database).await?;

        // Bind to address
        let addr = settings.server_addr();
        let listener = TcpListener::bind(addr.as_str()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        let state = AppState::new(settings, backends);
        let router = build_router(state);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
