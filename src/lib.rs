//! # Direct Chat Library
//!
//! A real-time direct-messaging server with:
//! - HTTP endpoints for accounts, people and conversation history
//! - WebSocket gateway for presence and message delivery
//! - PostgreSQL or in-memory storage
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and storage traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database, file storage and metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! direct_chat/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Storage and metrics implementations
//! +-- presentation/   HTTP routes and WebSocket gateway
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
