//! # Direct Chat
//!
//! Real-time direct-messaging server.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Message and user stores
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use direct_chat::config::Settings;
use direct_chat::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    direct_chat::telemetry::init_tracing();

    info!("Starting Direct Chat...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
