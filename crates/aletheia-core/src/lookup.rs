//! Collaborator seam for resolving usernames from the host's user store.

use std::collections::HashMap;
use std::fmt::Debug;

use thiserror::Error;

/// Error raised by a [`UserLookup`] implementation.
///
/// Callers in the bridge treat a lookup error the same as "not found" and
/// continue down the display-name fallback chain.
#[derive(Debug, Error)]
#[error("User lookup failed: {0}")]
pub struct LookupError(pub String);

/// Resolves a username by (realm, user id) against the host's user store.
///
/// This is the only view of the host's user model the bridge consumes;
/// implementations typically wrap a session handle owned by the host.
pub trait UserLookup: Send + Sync + Debug {
    /// Returns the username for a user id within a realm, if known.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be consulted; callers swallow
    /// it and fall back.
    fn username(&self, realm_id: &str, user_id: &str) -> Result<Option<String>, LookupError>;
}

/// Map-backed lookup for tests.
#[derive(Debug, Default)]
pub struct StaticLookup {
    users: HashMap<(String, String), String>,
}

impl StaticLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a username for a (realm, user id) pair.
    #[must_use]
    pub fn with_user(mut self, realm_id: &str, user_id: &str, username: &str) -> Self {
        self.users.insert(
            (realm_id.to_string(), user_id.to_string()),
            username.to_string(),
        );
        self
    }
}

impl UserLookup for StaticLookup {
    fn username(&self, realm_id: &str, user_id: &str) -> Result<Option<String>, LookupError> {
        Ok(self
            .users
            .get(&(realm_id.to_string(), user_id.to_string()))
            .cloned())
    }
}
