//! Intermediary issue.

use super::{Comment, IssueStatus, UpstreamComment, User};
use crate::config::{ConfigError, Route, SyncConfig, UpstreamSource};
use crate::matcher::match_ticket_keys;
use crate::normalize::scrub_content;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An upstream issue in the forge-neutral payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamIssue {
    /// Forge-wide issue id.
    pub id: u64,

    /// Issue number within the project.
    pub number: u64,

    /// Raw title.
    pub title: String,

    /// Web URL of the issue.
    pub html_url: String,

    /// Description, if any.
    #[serde(default)]
    pub body: Option<String>,

    /// Upstream state.
    pub state: IssueStatus,

    /// Label names.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Milestone title.
    #[serde(default)]
    pub milestone: Option<String>,

    /// Reporter.
    pub user: User,

    /// Assignees.
    #[serde(default)]
    pub assignees: Vec<User>,

    /// Comments in chronological order.
    #[serde(default)]
    pub comments: Vec<UpstreamComment>,
}

/// Canonical representation of one upstream issue.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Forge the issue came from.
    pub source: UpstreamSource,

    raw_title: String,

    /// Web URL of the issue.
    pub url: String,

    /// Upstream project name (e.g. "org/repo").
    pub upstream: String,

    /// Comments in chronological order.
    pub comments: Vec<Comment>,

    /// Label names.
    pub tags: Vec<String>,

    /// Mapped fix version.
    pub fix_version: Option<String>,

    /// Priority; the forge exposes none, so this stays unset.
    pub priority: Option<String>,

    /// ASCII-only, backslash-free description.
    pub content: Option<String>,

    /// Reporter.
    pub reporter: User,

    /// Assignees.
    pub assignees: Vec<User>,

    /// Open or closed.
    pub status: IssueStatus,

    /// Forge-wide id.
    pub id: String,

    /// Issue number within the project.
    pub upstream_id: u64,

    /// Where this issue lands downstream.
    pub downstream: Route,

    /// Ticket keys referenced by this issue, filled in during matching.
    pub jira_key: BTreeSet<String>,
}

impl Issue {
    /// Builds an issue, resolving its route from the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoute`] if `upstream` is not mapped.
    pub fn from_upstream(
        source: UpstreamSource,
        upstream: &str,
        issue: UpstreamIssue,
        config: &SyncConfig,
    ) -> Result<Self, ConfigError> {
        let route = config.route(source, upstream)?.clone();
        Ok(Self::with_route(source, upstream, issue, route))
    }

    /// Builds an issue with an explicitly supplied route.
    #[must_use]
    pub fn with_route(
        source: UpstreamSource,
        upstream: &str,
        issue: UpstreamIssue,
        downstream: Route,
    ) -> Self {
        let fix_version = downstream.fix_version_for(issue.milestone.as_deref());

        Self {
            source,
            raw_title: issue.title,
            url: issue.html_url,
            upstream: upstream.to_string(),
            comments: issue.comments.into_iter().map(Comment::from).collect(),
            tags: issue.labels,
            fix_version,
            priority: None,
            content: scrub_content(issue.body.as_deref()),
            reporter: issue.user,
            assignees: issue.assignees,
            status: issue.state,
            id: issue.id.to_string(),
            upstream_id: issue.number,
            downstream,
            jira_key: BTreeSet::new(),
        }
    }

    /// Returns the public title, `[<project>] <title>`.
    #[must_use]
    pub fn title(&self) -> String {
        format!("[{}] {}", self.upstream, self.raw_title)
    }

    /// Returns the raw upstream title.
    #[must_use]
    pub fn upstream_title(&self) -> &str {
        &self.raw_title
    }

    /// Re-runs the matcher over the current content and comments.
    pub fn resolve_ticket_keys(&mut self) -> &BTreeSet<String> {
        self.jira_key = match_ticket_keys(self.content.as_deref(), &self.comments);
        &self.jira_key
    }
}
