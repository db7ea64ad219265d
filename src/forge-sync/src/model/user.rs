//! Upstream people.

use serde::{Deserialize, Serialize};

/// A forge account as seen on an item or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Forge login (e.g. "octocat").
    pub login: String,

    /// Full name from the forge profile, when the user set one.
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    /// Creates a user with only a login.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            name: None,
        }
    }

    /// Returns the full name, falling back to the login.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.login)
    }
}
