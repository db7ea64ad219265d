//! Forge webhook payloads.

use super::UpstreamError;
use crate::config::{Route, SyncConfig, SyncKind, UpstreamSource};
use crate::model::{IssueStatus, PrEvent, UpstreamIssue, UpstreamPullRequest, User};
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    pull_request: Option<HookPullRequest>,
    #[serde(default)]
    issue: Option<HookIssue>,
    repository: Option<HookRepository>,
}

#[derive(Deserialize)]
struct HookRepository {
    full_name: String,
}

#[derive(Deserialize)]
struct HookLabel {
    name: String,
}

#[derive(Deserialize)]
struct HookMilestone {
    title: String,
}

#[derive(Deserialize)]
struct HookPullRequest {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<HookLabel>,
    #[serde(default)]
    milestone: Option<HookMilestone>,
    user: User,
    #[serde(default)]
    assignees: Vec<User>,
    #[serde(default)]
    merged_at: Option<String>,
}

#[derive(Deserialize)]
struct HookIssue {
    id: u64,
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    body: Option<String>,
    state: IssueStatus,
    #[serde(default)]
    labels: Vec<HookLabel>,
    #[serde(default)]
    milestone: Option<HookMilestone>,
    user: User,
    #[serde(default)]
    assignees: Vec<User>,
}

/// A single upstream change delivered by a forge webhook.
///
/// Webhook payloads carry no comments; callers that want them fetch them
/// separately before building the intermediary item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// A pull request changed.
    PullRequest {
        /// Project the pull request belongs to.
        project: String,
        /// Pull request payload.
        pull_request: UpstreamPullRequest,
        /// What happened to it.
        event: PrEvent,
    },

    /// An issue changed.
    Issue {
        /// Project the issue belongs to.
        project: String,
        /// Issue payload.
        issue: UpstreamIssue,
    },
}

impl UpstreamEvent {
    /// Returns the upstream project name.
    #[must_use]
    pub fn project(&self) -> &str {
        match self {
            Self::PullRequest { project, .. } | Self::Issue { project, .. } => project,
        }
    }

    /// Returns the kind of item this event is about.
    #[must_use]
    pub fn kind(&self) -> SyncKind {
        match self {
            Self::PullRequest { .. } => SyncKind::PullRequest,
            Self::Issue { .. } => SyncKind::Issue,
        }
    }

    /// Returns the route this event should be synced along.
    ///
    /// Events for unmapped projects, or for routes that do not sync this
    /// kind of item, have none.
    #[must_use]
    pub fn route<'a>(&self, config: &'a SyncConfig) -> Option<&'a Route> {
        let route = config.route(UpstreamSource::Github, self.project()).ok()?;
        route.syncs(self.kind()).then_some(route)
    }
}

/// Parses a GitHub webhook payload.
///
/// Returns `Ok(None)` for payloads that are neither pull request nor issue
/// events, and for issue events that are really about a pull request.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidPayload`] if the payload is not JSON of
/// the expected shape.
pub fn parse_event(payload: &[u8]) -> Result<Option<UpstreamEvent>, UpstreamError> {
    let payload: Payload = serde_json::from_slice(payload)?;
    let Some(repository) = payload.repository else {
        debug!("Ignoring payload without repository");
        return Ok(None);
    };
    let project = repository.full_name;

    if let Some(pr) = payload.pull_request {
        let action = payload.action.as_deref().unwrap_or_default();
        let event = PrEvent::from_action(action, pr.merged_at.is_some());

        return Ok(Some(UpstreamEvent::PullRequest {
            project,
            pull_request: UpstreamPullRequest {
                number: pr.number,
                title: pr.title,
                html_url: pr.html_url,
                body: pr.body,
                labels: pr.labels.into_iter().map(|label| label.name).collect(),
                milestone: pr.milestone.map(|milestone| milestone.title),
                user: pr.user,
                assignees: pr.assignees,
                comments: Vec::new(),
            },
            event,
        }));
    }

    if let Some(issue) = payload.issue {
        if issue.html_url.contains("/pull/") {
            debug!(url = %issue.html_url, "Ignoring issue event for a pull request");
            return Ok(None);
        }

        return Ok(Some(UpstreamEvent::Issue {
            project,
            issue: UpstreamIssue {
                id: issue.id,
                number: issue.number,
                title: issue.title,
                html_url: issue.html_url,
                body: issue.body,
                state: issue.state,
                labels: issue.labels.into_iter().map(|label| label.name).collect(),
                milestone: issue.milestone.map(|milestone| milestone.title),
                user: issue.user,
                assignees: issue.assignees,
                comments: Vec::new(),
            },
        }));
    }

    debug!(project = %project, "Ignoring payload that is neither a pull request nor an issue");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pr_payload(action: &str, merged_at: Option<&str>) -> Vec<u8> {
        json!({
            "action": action,
            "repository": { "full_name": "org/repo" },
            "pull_request": {
                "number": 7,
                "title": "Fix it",
                "html_url": "https://github.com/org/repo/pull/7",
                "body": "Fixes FACTORY-12",
                "labels": [{ "name": "bug" }],
                "milestone": null,
                "user": { "login": "octocat" },
                "assignees": [],
                "merged_at": merged_at
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn parses_merged_pull_request() {
        let event = parse_event(&pr_payload("closed", Some("2024-05-01T12:00:00Z")))
            .unwrap()
            .unwrap();

        match event {
            UpstreamEvent::PullRequest {
                project,
                pull_request,
                event,
            } => {
                assert_eq!(project, "org/repo");
                assert_eq!(event, PrEvent::Merged);
                assert_eq!(pull_request.labels, vec!["bug"]);
                assert!(pull_request.comments.is_empty());
            }
            other => panic!("expected pull request event, got {other:?}"),
        }
    }

    #[test]
    fn closed_without_merge_stays_closed() {
        let event = parse_event(&pr_payload("closed", None)).unwrap().unwrap();
        assert!(matches!(
            event,
            UpstreamEvent::PullRequest {
                event: PrEvent::Closed,
                ..
            }
        ));
    }

    #[test]
    fn ignores_issue_events_for_pull_requests() {
        let payload = json!({
            "action": "created",
            "repository": { "full_name": "org/repo" },
            "issue": {
                "id": 1,
                "number": 7,
                "title": "Fix it",
                "html_url": "https://github.com/org/repo/pull/7",
                "state": "open",
                "user": { "login": "octocat" }
            }
        });

        assert_eq!(parse_event(payload.to_string().as_bytes()).unwrap(), None);
    }

    #[test]
    fn ignores_unrelated_payloads() {
        let payload = json!({ "zen": "Keep it logically awesome.", "repository": { "full_name": "org/repo" } });
        assert_eq!(parse_event(payload.to_string().as_bytes()).unwrap(), None);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_event(b"not json"),
            Err(UpstreamError::InvalidPayload(_))
        ));
    }

    #[test]
    fn routes_only_synced_kinds() {
        let config = SyncConfig::parse(
            r#"
default-tracker = "main"

[trackers.main]
url = "https://issues.example.com"

[map.github."org/repo"]
project = "FACTORY"
sync = ["issue"]
"#,
            "test",
        )
        .unwrap();

        let event = parse_event(&pr_payload("opened", None)).unwrap().unwrap();
        assert_eq!(event.kind(), SyncKind::PullRequest);
        assert!(event.route(&config).is_none());
    }
}
