//! Issue field mirroring.
//!
//! Routes opt into each mirrored field through `issue-updates`. Every field
//! is compared against the ticket before writing, so a second run against an
//! unchanged issue leaves the ticket alone.

use super::{transition, SyncError, TicketUpdate};
use crate::config::{SyncConfig, StatusSync};
use crate::model::{Issue, IssueStatus};
use crate::templates::{mirrored_comment_prefix, CommentRenderer};
use crate::tracker::{FieldUpdate, NewTicket, Ticket, TicketFields, TrackerClient};
use regex::{NoExpand, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

const DESCRIPTION_MARKER: &str = "Upstream description:";

const STATUS_MARKER: &str = "Upstream issue status:";

static DESCRIPTION_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Upstream description: \{quote\}.*?\{quote\}")
        .expect("Invalid description block pattern")
});

static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Upstream issue status: [^\n]*").expect("Invalid status line pattern")
});

/// Finds the ticket already synced for an issue, or creates one.
///
/// Returns the ticket and whether it was created.
pub(super) async fn find_or_create<T: TrackerClient>(
    client: &T,
    issue: &Issue,
) -> Result<(Ticket, bool), SyncError> {
    let mut tickets = client.search_tickets(&existing_ticket_query(issue)).await?;

    if !tickets.is_empty() {
        if tickets.len() > 1 {
            warn!(count = tickets.len(), url = %issue.url, "Several tickets match issue, using the first");
        }
        let ticket = tickets.swap_remove(0);
        debug!(key = %ticket.key, "Found existing ticket for issue");
        return Ok((ticket, false));
    }

    let ticket = client.create_ticket(&new_ticket(issue)).await?;
    info!(key = %ticket.key, url = %issue.url, "Created ticket");
    Ok((ticket, true))
}

/// Query for a ticket carrying the issue's title or URL.
fn existing_ticket_query(issue: &Issue) -> String {
    let title = issue.title().replace(['[', ']', '"', '(', ')', '\\'], "");
    format!(
        "project = \"{}\" AND (summary ~ \"{title}\" OR text ~ \"{}\")",
        issue.downstream.project, issue.url
    )
}

fn new_ticket(issue: &Issue) -> NewTicket {
    let issue_type = if issue.tags.iter().any(|tag| tag == "story") {
        "Story"
    } else if issue.tags.iter().any(|tag| tag == "task") {
        "Task"
    } else {
        "Bug"
    };

    NewTicket {
        project: issue.downstream.project.clone(),
        summary: issue.title(),
        description: initial_description(issue),
        issue_type: issue_type.to_string(),
        labels: issue.downstream.labels.clone(),
    }
}

fn initial_description(issue: &Issue) -> String {
    let updates = &issue.downstream.issue_updates;

    let mut description = if updates.description {
        description_block(issue)
    } else {
        String::new()
    };
    if updates.transition.as_ref().is_some_and(StatusSync::enabled) {
        description = format!("{} {}\n{description}", STATUS_MARKER, issue.status);
    }
    if updates.url {
        description = format!("{description}\nUpstream URL: {}", issue.url);
    }
    description
}

fn description_block(issue: &Issue) -> String {
    let content = issue.content.as_deref().unwrap_or_default().replace("{quote}", "");
    format!("{DESCRIPTION_MARKER} {{quote}}{content}{{quote}}")
}

/// Brings the ticket's mirrored fields in line with the issue.
pub(super) async fn apply<T: TrackerClient>(
    client: &T,
    key: &str,
    issue: &Issue,
    config: &SyncConfig,
    renderer: &CommentRenderer,
    update: &mut TicketUpdate,
) -> Result<(), SyncError> {
    let updates = &issue.downstream.issue_updates;
    if !updates.mirrors_fields() {
        return Ok(());
    }

    if updates.comments {
        update.comments_mirrored = mirror_comments(client, key, issue, renderer).await?;
    }

    let current = client.ticket_fields(key).await?;
    let changes = plan_field_changes(&current, issue, config);
    if !changes.is_empty() {
        client.update_fields(key, &changes).await?;
        let fields = changes.changed();
        info!(key, ?fields, "Updated ticket fields");
        update.fields.extend(fields.into_iter().map(str::to_string));
    }

    if let (Some(sync), Some(version)) = (updates.fix_version, issue.fix_version.as_deref()) {
        if let Some(versions) = planned_fix_versions(&current.fix_versions, version, sync.overwrite)
        {
            update_fix_versions(client, key, version, versions, update).await?;
        }
    }

    if let Some(status) = updates.transition.as_ref().and_then(StatusSync::close_status) {
        if issue.status == IssueStatus::Closed && !current.status.eq_ignore_ascii_case(status) {
            let notice = renderer.render_close_notice(&issue.url, status)?;
            client.add_comment(key, &notice).await?;
            transition(client, key, status, update).await;
        }
    }

    Ok(())
}

/// Adds missing upstream comments and edits stale ones.
async fn mirror_comments<T: TrackerClient>(
    client: &T,
    key: &str,
    issue: &Issue,
    renderer: &CommentRenderer,
) -> Result<usize, SyncError> {
    let existing = client.comments(key).await?;
    let mut mirrored = 0;

    for comment in &issue.comments {
        let body = renderer.render_mirrored_comment(comment)?;
        let prefix = mirrored_comment_prefix(comment.id);

        match existing.iter().find(|c| c.body.starts_with(&prefix)) {
            Some(found) if found.body == body => {}
            Some(found) => {
                client.update_comment(key, &found.id, &body).await?;
                mirrored += 1;
            }
            None => {
                client.add_comment(key, &body).await?;
                mirrored += 1;
            }
        }
    }

    if mirrored > 0 {
        info!(key, mirrored, "Mirrored upstream comments");
    }
    Ok(mirrored)
}

/// A rejected fix version is reported on the ticket instead of failing the item.
async fn update_fix_versions<T: TrackerClient>(
    client: &T,
    key: &str,
    version: &str,
    versions: Vec<String>,
    update: &mut TicketUpdate,
) -> Result<(), SyncError> {
    let change = FieldUpdate {
        fix_versions: Some(versions),
        ..FieldUpdate::default()
    };

    match client.update_fields(key, &change).await {
        Ok(()) => {
            info!(key, version, "Updated fix version");
            update.fields.push("fixVersions".to_string());
        }
        Err(e) => {
            warn!(key, version, error = %e, "Fix version rejected");
            let notice = format!("Error updating fixVersion: {version}");
            let reported = client
                .comments(key)
                .await?
                .iter()
                .any(|comment| comment.body == notice);
            if !reported {
                client.add_comment(key, &notice).await?;
            }
        }
    }
    Ok(())
}

/// Computes the summary, description, label and assignee changes.
fn plan_field_changes(current: &TicketFields, issue: &Issue, config: &SyncConfig) -> FieldUpdate {
    let updates = &issue.downstream.issue_updates;
    let title = issue.title();

    let summary = (updates.title && current.summary != title).then_some(title);

    let existing = current.description.as_deref().unwrap_or_default();
    let description = Some(mirrored_description(existing, issue)).filter(|d| d != existing);

    FieldUpdate {
        summary,
        description,
        labels: planned_labels(&current.labels, issue),
        fix_versions: None,
        assignee: planned_assignee(current.assignee.as_deref(), issue, config),
    }
}

fn mirrored_description(current: &str, issue: &Issue) -> String {
    let updates = &issue.downstream.issue_updates;
    let mut description = current.to_string();

    if updates.description {
        let block = description_block(issue);
        description = if DESCRIPTION_BLOCK.is_match(&description) {
            DESCRIPTION_BLOCK
                .replace(&description, NoExpand(&block))
                .into_owned()
        } else {
            format!("{block} \n {description}")
        };
        if !updates.url {
            description = description.replace(&issue.url, "");
        }
    }

    if updates.transition.as_ref().is_some_and(StatusSync::enabled) {
        let line = format!("{STATUS_MARKER} {}", issue.status);
        if !description.contains(&line) {
            description = if STATUS_LINE.is_match(&description) {
                STATUS_LINE.replace(&description, NoExpand(&line)).into_owned()
            } else {
                format!("{line}\n{description}")
            };
        }
    }

    if updates.url && !description.contains(&issue.url) {
        description = format!("{description}\nUpstream URL: {}\n", issue.url);
    }

    description
}

fn planned_labels(current: &[String], issue: &Issue) -> Option<Vec<String>> {
    let updates = &issue.downstream.issue_updates;

    let mut labels: BTreeSet<String> = match updates.tags {
        Some(sync) => {
            // Tracker labels cannot contain spaces
            let mut labels: BTreeSet<String> =
                issue.tags.iter().map(|tag| tag.replace(' ', "_")).collect();
            if !sync.overwrite {
                labels.extend(current.iter().cloned());
            }
            labels
        }
        None => current.iter().cloned().collect(),
    };

    if let Some(on_close) = &updates.on_close {
        if issue.status == IssueStatus::Closed {
            labels.extend(on_close.apply_labels.iter().cloned());
        }
    }

    let existing: BTreeSet<&str> = current.iter().map(String::as_str).collect();
    let unchanged =
        labels.len() == existing.len() && labels.iter().all(|l| existing.contains(l.as_str()));
    (!unchanged).then(|| labels.into_iter().collect())
}

fn planned_assignee(
    current: Option<&str>,
    issue: &Issue,
    config: &SyncConfig,
) -> Option<Option<String>> {
    let sync = issue.downstream.issue_updates.assignee?;

    let Some(assignee) = issue.assignees.first() else {
        return (sync.overwrite && current.is_some()).then_some(None);
    };

    let Some(account) = config.account_id(&assignee.login) else {
        warn!(login = %assignee.login, "Assignee has no tracker account, leaving ticket assignee");
        return None;
    };

    let replace = match current {
        None => true,
        Some(existing) => existing != account && sync.overwrite,
    };
    replace.then(|| Some(account.to_string()))
}

fn planned_fix_versions(current: &[String], version: &str, overwrite: bool) -> Option<Vec<String>> {
    let mut versions: Vec<String> = if overwrite {
        Vec::new()
    } else {
        current.to_vec()
    };
    if !versions.iter().any(|v| v == version) {
        versions.push(version.to_string());
    }

    let unchanged = versions.len() == current.len() && versions.iter().all(|v| current.contains(v));
    (!unchanged).then_some(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSync, IssueUpdates, OnClose, Route, UpstreamSource};
    use crate::model::{UpstreamIssue, User};

    const URL: &str = "https://github.com/org/repo/issues/42";

    const CONFIG: &str = r#"
default-tracker = "main"

[trackers.main]
url = "https://issues.example.com"

[users.octocat]
account-id = "557058:abcd"
"#;

    fn config() -> SyncConfig {
        SyncConfig::parse(CONFIG, "test").unwrap()
    }

    fn issue(updates: IssueUpdates) -> Issue {
        let mut route = Route::new("FACTORY");
        route.issue_updates = updates;
        let payload = UpstreamIssue {
            id: 9001,
            number: 42,
            title: "Crash on start".to_string(),
            html_url: URL.to_string(),
            body: Some("It crashes".to_string()),
            state: IssueStatus::Open,
            labels: vec!["needs triage".to_string()],
            milestone: None,
            user: User::new("hubot"),
            assignees: vec![User::new("octocat")],
            comments: Vec::new(),
        };
        Issue::with_route(UpstreamSource::Github, "org/repo", payload, route)
    }

    #[test]
    fn nothing_planned_without_opt_in() {
        let issue = issue(IssueUpdates::default());
        let current = TicketFields {
            summary: "Something else".to_string(),
            labels: vec!["old".to_string()],
            ..TicketFields::default()
        };

        assert!(plan_field_changes(&current, &issue, &config()).is_empty());
    }

    #[test]
    fn plans_title_and_merged_labels() {
        let issue = issue(IssueUpdates {
            title: true,
            tags: Some(FieldSync::default()),
            ..IssueUpdates::default()
        });
        let current = TicketFields {
            summary: "Old title".to_string(),
            labels: vec!["keep-me".to_string()],
            ..TicketFields::default()
        };

        let changes = plan_field_changes(&current, &issue, &config());

        assert_eq!(changes.summary.as_deref(), Some("[org/repo] Crash on start"));
        assert_eq!(
            changes.labels,
            Some(vec!["keep-me".to_string(), "needs_triage".to_string()])
        );
        assert_eq!(changes.changed(), vec!["summary", "labels"]);
    }

    #[test]
    fn overwritten_labels_drop_tracker_only_labels() {
        let issue = issue(IssueUpdates {
            tags: Some(FieldSync { overwrite: true }),
            ..IssueUpdates::default()
        });

        assert_eq!(
            planned_labels(&["keep-me".to_string()], &issue),
            Some(vec!["needs_triage".to_string()])
        );
        assert_eq!(planned_labels(&["needs_triage".to_string()], &issue), None);
    }

    #[test]
    fn on_close_labels_wait_for_close() {
        let mut issue = issue(IssueUpdates {
            on_close: Some(OnClose {
                apply_labels: vec!["closed-upstream".to_string()],
            }),
            ..IssueUpdates::default()
        });
        let current = vec!["bug".to_string()];

        assert_eq!(planned_labels(&current, &issue), None);

        issue.status = IssueStatus::Closed;
        assert_eq!(
            planned_labels(&current, &issue),
            Some(vec!["bug".to_string(), "closed-upstream".to_string()])
        );
    }

    #[test]
    fn description_block_is_replaced_in_place() {
        let issue = issue(IssueUpdates {
            description: true,
            ..IssueUpdates::default()
        });

        let first = mirrored_description("Notes from triage", &issue);
        assert_eq!(
            first,
            "Upstream description: {quote}It crashes{quote} \n Notes from triage"
        );
        assert_eq!(mirrored_description(&first, &issue), first);

        let stale = "Upstream description: {quote}Old text\nover lines{quote} \n Notes";
        assert_eq!(
            mirrored_description(stale, &issue),
            "Upstream description: {quote}It crashes{quote} \n Notes"
        );
    }

    #[test]
    fn status_line_tracks_issue_status() {
        let mut issue = issue(IssueUpdates {
            transition: Some(StatusSync::Enabled(true)),
            url: true,
            ..IssueUpdates::default()
        });

        let open = mirrored_description("", &issue);
        assert_eq!(
            open,
            format!("Upstream issue status: Open\n\nUpstream URL: {URL}\n")
        );
        assert_eq!(mirrored_description(&open, &issue), open);

        issue.status = IssueStatus::Closed;
        assert_eq!(
            mirrored_description(&open, &issue),
            format!("Upstream issue status: Closed\n\nUpstream URL: {URL}\n")
        );
    }

    #[test]
    fn assignee_follows_user_mapping() {
        let config = config();
        let mut issue = issue(IssueUpdates {
            assignee: Some(FieldSync::default()),
            ..IssueUpdates::default()
        });

        assert_eq!(
            planned_assignee(None, &issue, &config),
            Some(Some("557058:abcd".to_string()))
        );
        assert_eq!(planned_assignee(Some("someone-else"), &issue, &config), None);
        assert_eq!(planned_assignee(Some("557058:abcd"), &issue, &config), None);

        issue.downstream.issue_updates.assignee = Some(FieldSync { overwrite: true });
        assert_eq!(
            planned_assignee(Some("someone-else"), &issue, &config),
            Some(Some("557058:abcd".to_string()))
        );

        issue.assignees.clear();
        assert_eq!(planned_assignee(Some("someone-else"), &issue, &config), Some(None));
        assert_eq!(planned_assignee(None, &issue, &config), None);
    }

    #[test]
    fn unmapped_assignee_is_left_alone() {
        let mut issue = issue(IssueUpdates {
            assignee: Some(FieldSync { overwrite: true }),
            ..IssueUpdates::default()
        });
        issue.assignees = vec![User::new("stranger")];

        assert_eq!(planned_assignee(Some("557058:abcd"), &issue, &config()), None);
    }

    #[test]
    fn fix_versions_merge_or_replace() {
        let current = vec!["FACTORY 1.1".to_string()];

        assert_eq!(
            planned_fix_versions(&current, "FACTORY 1.2", false),
            Some(vec!["FACTORY 1.1".to_string(), "FACTORY 1.2".to_string()])
        );
        assert_eq!(
            planned_fix_versions(&current, "FACTORY 1.2", true),
            Some(vec!["FACTORY 1.2".to_string()])
        );
        assert_eq!(planned_fix_versions(&current, "FACTORY 1.1", true), None);
    }

    #[test]
    fn new_ticket_type_follows_labels() {
        let mut issue = issue(IssueUpdates {
            transition: Some(StatusSync::CloseAs("Closed".to_string())),
            ..IssueUpdates::default()
        });
        issue.downstream.labels = vec!["upstream".to_string()];

        let ticket = new_ticket(&issue);
        assert_eq!(ticket.issue_type, "Bug");
        assert_eq!(ticket.summary, "[org/repo] Crash on start");
        assert_eq!(ticket.description, "Upstream issue status: Open\n");
        assert_eq!(ticket.labels, vec!["upstream"]);

        issue.tags.push("story".to_string());
        assert_eq!(new_ticket(&issue).issue_type, "Story");
    }

    #[test]
    fn lookup_query_strips_markup() {
        let issue = issue(IssueUpdates::default());
        assert_eq!(
            existing_ticket_query(&issue),
            format!(
                "project = \"FACTORY\" AND (summary ~ \"org/repo Crash on start\" OR text ~ \"{URL}\")"
            )
        );
    }
}
