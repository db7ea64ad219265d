//! Pull request lifecycle events.

use std::fmt;

/// Lifecycle event that triggered a pull request sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrEvent {
    /// Opened, or seen during a full sync.
    Opened,

    /// Closed without merging.
    Closed,

    /// Reopened after being closed.
    Reopened,

    /// Merged.
    Merged,

    /// Any other webhook action (edited, labeled, ...).
    Other(String),
}

impl PrEvent {
    /// Builds the event for a forge webhook action.
    ///
    /// A `closed` action on a merged pull request is reported as a merge.
    #[must_use]
    pub fn from_action(action: &str, merged: bool) -> Self {
        match action {
            "closed" if merged => Self::Merged,
            other => Self::from_suffix(other),
        }
    }

    /// Classifies a free-form suffix by the event word it contains.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Self {
        if suffix.contains("closed") {
            Self::Closed
        } else if suffix.contains("reopened") {
            Self::Reopened
        } else if suffix.contains("merged") {
            Self::Merged
        } else if suffix == "open" || suffix == "opened" {
            Self::Opened
        } else {
            Self::Other(suffix.to_string())
        }
    }

    /// Returns the suffix string for this event.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Merged => "merged",
            Self::Other(suffix) => suffix,
        }
    }

    /// Returns true for the merge event.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        matches!(self, Self::Merged)
    }
}

impl fmt::Display for PrEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_and_merged_is_a_merge() {
        assert_eq!(PrEvent::from_action("closed", true), PrEvent::Merged);
        assert_eq!(PrEvent::from_action("closed", false), PrEvent::Closed);
    }

    #[test]
    fn classifies_suffixes() {
        assert_eq!(PrEvent::from_suffix("reopened"), PrEvent::Reopened);
        assert_eq!(PrEvent::from_suffix("open"), PrEvent::Opened);
        assert_eq!(PrEvent::from_suffix("pr.merged"), PrEvent::Merged);
        assert_eq!(
            PrEvent::from_suffix("edited"),
            PrEvent::Other("edited".to_string())
        );
    }

    #[test]
    fn only_merge_is_merge() {
        assert!(PrEvent::Merged.is_merge());
        assert!(!PrEvent::Closed.is_merge());
        assert!(!PrEvent::Other("merged-ish".to_string()).is_merge());
    }
}
