//! Data Transfer Objects
//!
//! DTOs for API request/response serialization.

pub mod request;
pub mod response;

pub use request::CredentialsRequest;
pub use response::{AuthResponse, MessageResponse, PersonResponse, ProfileResponse};
