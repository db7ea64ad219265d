//! Intermediary pull request.

use super::{Comment, PrEvent, UpstreamComment, User};
use crate::config::{ConfigError, Route, SyncConfig, UpstreamSource};
use crate::matcher::match_ticket_keys;
use crate::normalize::scrub_content;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An upstream pull request in the forge-neutral payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamPullRequest {
    /// Pull request number within the project.
    pub number: u64,

    /// Raw title.
    pub title: String,

    /// Web URL of the pull request.
    pub html_url: String,

    /// Description, if any.
    #[serde(default)]
    pub body: Option<String>,

    /// Label names.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Milestone title.
    #[serde(default)]
    pub milestone: Option<String>,

    /// Author.
    pub user: User,

    /// Assignees.
    #[serde(default)]
    pub assignees: Vec<User>,

    /// Comments in chronological order.
    #[serde(default)]
    pub comments: Vec<UpstreamComment>,
}

/// Canonical representation of one upstream pull request.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// Forge the pull request came from.
    pub source: UpstreamSource,

    /// Ticket keys believed to reference this pull request.
    pub jira_key: BTreeSet<String>,

    raw_title: String,

    /// Web URL of the pull request.
    pub url: String,

    /// Upstream project name (e.g. "org/repo").
    pub upstream: String,

    /// Comments in chronological order.
    pub comments: Vec<Comment>,

    /// Label names.
    pub tags: Vec<String>,

    /// Milestone title, unmapped.
    pub fix_version: Option<String>,

    /// Priority; the forge exposes none, so this stays unset.
    pub priority: Option<String>,

    /// ASCII-only, backslash-free description.
    pub content: Option<String>,

    /// Author.
    pub reporter: User,

    /// Assignees.
    pub assignees: Vec<User>,

    /// Pull request number.
    pub id: u64,

    /// Event that triggered this sync.
    pub suffix: PrEvent,

    /// Candidate ticket keys found at construction.
    pub matched: BTreeSet<String>,

    /// Where this pull request lands downstream.
    pub downstream: Route,
}

impl PullRequest {
    /// Builds a pull request, resolving its route from the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoute`] if `upstream` is not mapped.
    pub fn from_upstream(
        source: UpstreamSource,
        upstream: &str,
        pr: UpstreamPullRequest,
        suffix: PrEvent,
        config: &SyncConfig,
    ) -> Result<Self, ConfigError> {
        let route = config.route(source, upstream)?.clone();
        Ok(Self::with_route(source, upstream, pr, suffix, route))
    }

    /// Builds a pull request with an explicitly supplied route.
    #[must_use]
    pub fn with_route(
        source: UpstreamSource,
        upstream: &str,
        pr: UpstreamPullRequest,
        suffix: PrEvent,
        downstream: Route,
    ) -> Self {
        let comments: Vec<Comment> = pr.comments.into_iter().map(Comment::from).collect();
        let matched = match_ticket_keys(pr.body.as_deref(), &comments);
        let body = pr.body.as_deref().filter(|body| !body.is_empty());

        Self {
            source,
            jira_key: matched.clone(),
            raw_title: pr.title,
            url: pr.html_url,
            upstream: upstream.to_string(),
            comments,
            tags: pr.labels,
            fix_version: pr.milestone,
            priority: None,
            content: scrub_content(body),
            reporter: pr.user,
            assignees: pr.assignees,
            id: pr.number,
            suffix,
            matched,
            downstream,
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
}
