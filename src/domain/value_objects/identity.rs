//! Authenticated identity value object.

use std::fmt;

/// The user a token vouches for.
///
/// Issued once at login/registration inside a signed token and trusted as-is
/// afterwards; nothing re-reads the user table per message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

impl Identity {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.user_id)
    }
}
