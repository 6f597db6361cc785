//! User directory used to resolve `@[username]` mentions.
//!
//! The renderer only needs two questions answered: "is this exact user active?"
//! and "which active users look like this query?". Anything that can answer
//! them (a database, an HTTP service, a fixed list) implements
//! [`UserDirectory`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// A user account as seen by the mention resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Create an active user.
    pub fn active(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_active: true,
        }
    }

    /// Create a deactivated user.
    pub fn inactive(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_active: false,
        }
    }
}

/// Source of user accounts.
///
/// Lookups may block. Errors are surfaced to the caller unchanged.
pub trait UserDirectory: Send + Sync {
    /// Find an active user whose username equals `username` exactly.
    fn find_active_user(&self, username: &str) -> Result<Option<User>, LookupError>;

    /// Find active users whose username contains `query`, ignoring case.
    fn search_active_users(&self, query: &str) -> Result<Vec<User>, LookupError>;
}

/// In-memory user directory.
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    users: Vec<User>,
}

impl StaticDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Parse a JSON array of `{"username": ..., "is_active": ...}` objects.
    pub fn from_json(json: &str) -> Result<Self, LookupError> {
        let users: Vec<User> = serde_json::from_str(json)?;
        Ok(Self::new(users))
    }

    /// Load a JSON user list from disk.
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let json = fs::read_to_string(path)?;
        let directory = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), users = directory.len(), "Loaded user directory");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for StaticDirectory {
    fn find_active_user(&self, username: &str) -> Result<Option<User>, LookupError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.is_active && user.username == username)
            .cloned())
    }

    fn search_active_users(&self, query: &str) -> Result<Vec<User>, LookupError> {
        let needle = query.to_lowercase();
        Ok(self
            .users
            .iter()
            .filter(|user| user.is_active && user.username.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
