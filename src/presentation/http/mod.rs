//! HTTP Interface
//!
//! REST endpoints for accounts, people, history and operations.

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use routes::create_router;
