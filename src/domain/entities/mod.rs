//! # Domain Entities
//!
//! Core domain entities of the chat server.
//!
//! - **User**: account with username and password hash
//! - **Message**: a direct message from one user to another
//! - **Attachment**: a decoded file on its way to the content store
//!
//! ## Repository Traits
//!
//! Each entity has an associated storage trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle.

mod attachment;
mod message;
mod user;

pub use attachment::{Attachment, AttachmentError, AttachmentStore, FALLBACK_EXTENSION};
pub use message::{Message, MessageRepository};
pub use user::{User, UserRepository};
