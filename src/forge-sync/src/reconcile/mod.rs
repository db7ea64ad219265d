//! Reconciliation engine.
//!
//! Given an intermediary item, this module looks up every ticket key the
//! item references and brings each uniquely resolved ticket up to date:
//! a remote link back to the item, the rendered event comment, and the
//! transitions the route asks for. Issues can additionally mirror their
//! fields onto those tickets, or onto a ticket of their own when they
//! reference none. Every step checks the ticket first, so running it again
//! against an unchanged tracker changes nothing.

mod error;
mod issue_updates;
mod report;

pub use error::SyncError;
pub use report::{AbandonReason, AbandonedCandidate, SyncOutcome, SyncReport, TicketUpdate};

use crate::config::{Route, SyncConfig};
use crate::model::{Issue, PrEvent, PullRequest, User};
use crate::templates::{
    generate_issue_link_title, generate_link_title, reporter_mention, CommentRenderer,
    CommentTemplate,
};
use crate::tracker::{RemoteLink, Ticket, TrackerClient, TrackerConnector, TrackerError};
use std::collections::BTreeSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// The parts of an item the engine needs.
struct Target<'a> {
    kind: &'static str,
    upstream: &'a str,
    title: String,
    url: &'a str,
    reporter: &'a User,
    template: CommentTemplate,
    route: &'a Route,
    keys: &'a BTreeSet<String>,
    issue: Option<&'a Issue>,
}

/// Reconciles a pull request with the tickets it references.
///
/// # Errors
///
/// Returns [`SyncError`] if the route's tracker cannot be resolved or
/// connected to, or if updating a resolved ticket fails.
pub async fn sync_pull_request<C: TrackerConnector>(
    pr: &PullRequest,
    config: &SyncConfig,
    connector: &C,
) -> Result<SyncReport, SyncError> {
    let target = Target {
        kind: "pull_request",
        upstream: &pr.upstream,
        title: pr.title(),
        url: &pr.url,
        reporter: &pr.reporter,
        template: CommentTemplate::for_event(&pr.suffix),
        route: &pr.downstream,
        keys: &pr.jira_key,
        issue: None,
    };

    let span = info_span!("sync_pull_request", upstream = %pr.upstream, number = pr.id, event = %pr.suffix);
    reconcile(target, config, connector).instrument(span).await
}

/// Reconciles an issue with the tickets it references.
///
/// The ticket keys are re-derived from the issue's current content and
/// comments first. Routes with `issue-updates` also mirror the issue's
/// fields onto every resolved ticket, and with `create` an issue that
/// references no key is synced to a ticket of its own.
///
/// # Errors
///
/// Returns [`SyncError`] under the same conditions as [`sync_pull_request`].
pub async fn sync_issue<C: TrackerConnector>(
    issue: &mut Issue,
    config: &SyncConfig,
    connector: &C,
) -> Result<SyncReport, SyncError> {
    issue.resolve_ticket_keys();
    let issue = &*issue;

    let target = Target {
        kind: "issue",
        upstream: &issue.upstream,
        title: issue.title(),
        url: &issue.url,
        reporter: &issue.reporter,
        template: CommentTemplate::for_event(&PrEvent::Opened),
        route: &issue.downstream,
        keys: &issue.jira_key,
        issue: Some(issue),
    };

    let span = info_span!("sync_issue", upstream = %issue.upstream, number = issue.upstream_id);
    reconcile(target, config, connector).instrument(span).await
}

async fn reconcile<C: TrackerConnector>(
    target: Target<'_>,
    config: &SyncConfig,
    connector: &C,
) -> Result<SyncReport, SyncError> {
    if config.testing {
        info!(kind = target.kind, url = target.url, "Testing mode, leaving tracker untouched");
        return Ok(SyncReport::new(SyncOutcome::DryRun));
    }

    if target.keys.is_empty() {
        if let Some(issue) = target.issue.filter(|i| i.downstream.issue_updates.create) {
            return sync_own_ticket(issue, config, connector).await;
        }
        debug!(kind = target.kind, url = target.url, "No ticket keys referenced");
        return Ok(SyncReport::new(SyncOutcome::NoCandidates));
    }

    let instance = config.tracker_for(target.route)?;
    let client = connector.connect(instance)?;
    let renderer = CommentRenderer::new();
    let comment = renderer.render_comment(
        target.template,
        &target.title,
        target.url,
        &reporter_mention(config, target.reporter),
    )?;

    let mut report = SyncReport::new(SyncOutcome::Unresolved);
    for key in target.keys {
        let Some(ticket) = resolve_ticket(&client, key, &mut report).await else {
            continue;
        };

        let mut update = update_ticket(&client, &ticket, &target, &comment).await?;
        if let Some(issue) = target.issue {
            issue_updates::apply(&client, &ticket.key, issue, config, &renderer, &mut update)
                .await?;
        }
        report.updated.push(update);
    }

    if !report.updated.is_empty() {
        report.outcome = SyncOutcome::Synced;
    }

    info!(
        kind = target.kind,
        upstream = target.upstream,
        updated = report.updated.len(),
        abandoned = report.abandoned.len(),
        "Reconciled item"
    );
    Ok(report)
}

/// Syncs an issue that references no key to the ticket made for it.
async fn sync_own_ticket<C: TrackerConnector>(
    issue: &Issue,
    config: &SyncConfig,
    connector: &C,
) -> Result<SyncReport, SyncError> {
    let instance = config.tracker_for(&issue.downstream)?;
    let client = connector.connect(instance)?;

    let (ticket, created) = issue_updates::find_or_create(&client, issue).await?;
    let key = ticket.key.as_str();
    let mut update = TicketUpdate {
        key: key.to_string(),
        created,
        ..TicketUpdate::default()
    };

    let linked = client
        .remote_links(key)
        .await?
        .iter()
        .any(|link| link.url == issue.url);
    if !linked {
        let link = RemoteLink {
            url: issue.url.clone(),
            title: generate_issue_link_title(&issue.title()),
        };
        client.attach_remote_link(key, &link).await?;
        info!(key, url = %issue.url, "Attached remote link");
        update.link_attached = true;
    }

    if created {
        if let Some(status) = issue.downstream.default_status.as_deref() {
            transition(&client, key, status, &mut update).await;
        }
    }

    let renderer = CommentRenderer::new();
    issue_updates::apply(&client, key, issue, config, &renderer, &mut update).await?;

    info!(key, created, url = %issue.url, "Reconciled issue ticket");
    let mut report = SyncReport::new(SyncOutcome::Synced);
    report.updated.push(update);
    Ok(report)
}

/// Looks up a candidate key, recording it as abandoned unless exactly one
/// ticket matches.
async fn resolve_ticket<T: TrackerClient>(
    client: &T,
    key: &str,
    report: &mut SyncReport,
) -> Option<Ticket> {
    let reason = match client.search_tickets(&format!("key = {key}")).await {
        Ok(mut tickets) if tickets.len() == 1 => return tickets.pop(),
        Ok(tickets) if tickets.is_empty() => AbandonReason::NotFound,
        Ok(tickets) => AbandonReason::Ambiguous {
            count: tickets.len(),
        },
        Err(e) => AbandonReason::QueryFailed {
            message: e.to_string(),
        },
    };

    warn!(key, ?reason, "Could not resolve ticket, skipping candidate");
    report.abandoned.push(AbandonedCandidate {
        key: key.to_string(),
        reason,
    });
    None
}

async fn update_ticket<T: TrackerClient>(
    client: &T,
    ticket: &Ticket,
    target: &Target<'_>,
    comment: &str,
) -> Result<TicketUpdate, SyncError> {
    let key = ticket.key.as_str();
    let mut update = TicketUpdate {
        key: key.to_string(),
        ..TicketUpdate::default()
    };

    let link_existed = client
        .remote_links(key)
        .await?
        .iter()
        .any(|link| link.url == target.url);

    if link_existed {
        debug!(key, "Remote link already present");
    } else {
        let link = RemoteLink {
            url: target.url.to_string(),
            title: generate_link_title(&target.title),
        };
        client.attach_remote_link(key, &link).await?;
        info!(key, url = target.url, "Attached remote link");
        update.link_attached = true;
    }

    let comment_exists = client
        .comments(key)
        .await?
        .iter()
        .any(|existing| existing.body == comment);

    if comment_exists {
        debug!(key, "Comment already present");
    } else {
        client.add_comment(key, comment).await?;
        info!(key, "Added comment");
        update.comment_added = true;
    }

    let updates = &target.route.pr_updates;
    if let Some(status) = updates.merge_transition.as_deref() {
        if target.template == CommentTemplate::Merged {
            transition(client, key, status, &mut update).await;
        }
    }

    if let Some(status) = updates.link_transition.as_deref() {
        if target.template == CommentTemplate::Mentioned && !link_existed {
            transition(client, key, status, &mut update).await;
        }
    }

    Ok(update)
}

/// Requests a status change. A failed transition is logged and skipped so
/// the remaining updates still run.
async fn transition<T: TrackerClient>(
    client: &T,
    key: &str,
    status: &str,
    update: &mut TicketUpdate,
) {
    match client.change_status(key, status).await {
        Ok(()) => update.transitions.push(status.to_string()),
        Err(TrackerError::Transition { .. }) => {
            warn!(key, status, "Transition not available, skipping");
        }
        Err(e) => {
            error!(key, status, error = %e, "Transition failed, skipping");
        }
    }
}
