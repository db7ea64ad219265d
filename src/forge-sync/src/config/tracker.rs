//! Tracker instance and user mapping settings.

use serde::Deserialize;
use std::fmt;

/// Connection settings for one downstream tracker.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TrackerInstance {
    /// Base URL of the tracker (e.g. "https://issues.example.com").
    pub url: String,

    /// Username for basic auth (optional, falls back to FORGE_SYNC_TRACKER_USERNAME).
    pub username: Option<String>,

    /// API token or password (optional, falls back to FORGE_SYNC_TRACKER_TOKEN).
    pub token: Option<String>,
}

impl fmt::Debug for TrackerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerInstance")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Downstream identity of an upstream user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct UserMapping {
    /// Tracker account id used for `[~accountid:...]` mentions.
    pub account_id: String,
}
