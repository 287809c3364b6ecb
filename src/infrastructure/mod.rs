//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL and in-memory)
//! - Attachment content storage (local disk)
//! - Prometheus metrics

pub mod database;
pub mod metrics;
pub mod repositories;
pub mod storage;
