//! Issue status types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status of an upstream issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Issue is open upstream.
    Open,

    /// Issue is closed upstream.
    Closed,
}

impl IssueStatus {
    /// Returns the status label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
