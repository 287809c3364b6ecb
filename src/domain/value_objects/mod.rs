//! Value Objects
//!
//! Immutable types compared by value.

mod identity;

pub use identity::Identity;
