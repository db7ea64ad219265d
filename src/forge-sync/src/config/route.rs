//! Per-project routing entries.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Forge an upstream item comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpstreamSource {
    /// github.com
    Github,
}

impl UpstreamSource {
    /// All forges the routing table may reference.
    pub const ALL: [UpstreamSource; 1] = [UpstreamSource::Github];

    /// Returns the key used for this forge in the `map` table.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
        }
    }
}

impl fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpstreamSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown upstream source '{s}'"))
    }
}

/// Kind of upstream item a route opts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    /// Plain issues.
    Issue,
    /// Pull requests.
    PullRequest,
}

/// Tracker updates applied when a pull request is reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PrUpdates {
    /// Status to move the ticket to when the pull request is merged.
    pub merge_transition: Option<String>,

    /// Status to move the ticket to the first time a pull request links to it.
    pub link_transition: Option<String>,
}

/// Opt-in for a mirrored ticket field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FieldSync {
    /// Replace the ticket's values instead of merging into them.
    #[serde(default)]
    pub overwrite: bool,
}

/// How the upstream issue status is carried onto the ticket.
///
/// `true` keeps an `Upstream issue status:` line in the description; a
/// status name additionally moves the ticket there once the issue closes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusSync {
    /// Description line only, or disabled when `false`.
    Enabled(bool),
    /// Description line plus a transition to this status on close.
    CloseAs(String),
}

impl StatusSync {
    /// Returns true unless explicitly disabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }

    /// Status to move the ticket to when the issue closes.
    #[must_use]
    pub fn close_status(&self) -> Option<&str> {
        match self {
            Self::CloseAs(status) => Some(status),
            Self::Enabled(_) => None,
        }
    }
}

/// Updates applied once the upstream issue is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OnClose {
    /// Labels added to the ticket.
    #[serde(default)]
    pub apply_labels: Vec<String>,
}

/// Tracker updates applied when an issue is reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct IssueUpdates {
    /// Find or create a ticket for issues that reference none.
    #[serde(default)]
    pub create: bool,

    /// Mirror upstream comments.
    #[serde(default)]
    pub comments: bool,

    /// Keep the ticket summary equal to the issue title.
    #[serde(default)]
    pub title: bool,

    /// Keep an `Upstream description:` block in the ticket description.
    #[serde(default)]
    pub description: bool,

    /// Keep an `Upstream URL:` line in the ticket description.
    #[serde(default)]
    pub url: bool,

    /// Mirror labels.
    pub tags: Option<FieldSync>,

    /// Mirror the mapped fix version.
    pub fix_version: Option<FieldSync>,

    /// Mirror the first assignee through the `users` table.
    pub assignee: Option<FieldSync>,

    /// Mirror the issue status.
    pub transition: Option<StatusSync>,

    /// Updates applied once the issue is closed.
    pub on_close: Option<OnClose>,
}

impl IssueUpdates {
    /// Returns true if any field of an existing ticket is mirrored.
    #[must_use]
    pub fn mirrors_fields(&self) -> bool {
        self.comments
            || self.title
            || self.description
            || self.url
            || self.tags.is_some()
            || self.fix_version.is_some()
            || self.assignee.is_some()
            || self.transition.as_ref().is_some_and(StatusSync::enabled)
            || self.on_close.is_some()
    }
}

/// Where items from one upstream project land, and which updates apply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Route {
    /// Downstream project key.
    pub project: String,

    /// Item kinds synced for this project.
    #[serde(default)]
    pub sync: Vec<SyncKind>,

    /// Tracker instance name; falls back to `default-tracker`.
    pub tracker: Option<String>,

    /// Fix-version template, `XXX` is replaced with the upstream milestone.
    pub fix_version: Option<String>,

    /// Pull request driven ticket transitions.
    #[serde(default)]
    pub pr_updates: PrUpdates,

    /// Issue driven ticket updates.
    #[serde(default)]
    pub issue_updates: IssueUpdates,

    /// Labels set on tickets created for this project.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Status a freshly created ticket is moved to.
    pub default_status: Option<String>,
}

impl Route {
    /// Creates a route for `project` with no optional behaviour enabled.
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            sync: Vec::new(),
            tracker: None,
            fix_version: None,
            pr_updates: PrUpdates::default(),
            issue_updates: IssueUpdates::default(),
            labels: Vec::new(),
            default_status: None,
        }
    }

    /// Returns true if items of `kind` should be synced.
    #[must_use]
    pub fn syncs(&self, kind: SyncKind) -> bool {
        self.sync.contains(&kind)
    }

    /// Builds the fix version for an item with the given milestone.
    ///
    /// Without a milestone there is nothing to map. Without a template the
    /// milestone is used verbatim.
    #[must_use]
    pub fn fix_version_for(&self, milestone: Option<&str>) -> Option<String> {
        let milestone = milestone?;
        Some(match &self.fix_version {
            Some(template) => template.replace("XXX", milestone),
            None => milestone.to_string(),
        })
    }
}
