//! Orchestrates full syncs and webhook deliveries.

mod config;
mod error;

pub use config::RunnerConfig;
pub use error::RunnerError;

use crate::config::{Route, SyncConfig, SyncKind, UpstreamSource};
use crate::model::{Issue, PrEvent, PullRequest};
use crate::reconcile::{sync_issue, sync_pull_request};
use crate::summary::{ProcessingResult, RunSummary};
use crate::tracker::{JiraConnector, TrackerConnector};
use crate::upstream::{
    fetch_comments, fetch_issues, fetch_pull_requests, parse_event, UpstreamEvent,
};
use octocrab::Octocrab;
use tracing::{error, info, warn};

/// Orchestrates reconciliation of upstream items with the tracker.
pub struct Runner<C = JiraConnector> {
    config: SyncConfig,
    octocrab: Octocrab,
    connector: C,
    repo: Option<String>,
}

impl Runner<JiraConnector> {
    /// Builds a runner from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the sync config cannot be loaded or the
    /// GitHub client cannot be built.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let mut sync_config = SyncConfig::load(config.config_path())?;
        if config.testing() {
            sync_config.testing = true;
        }

        let mut builder = Octocrab::builder();
        if let Some(token) = config.token() {
            builder = builder.personal_token(token.to_string());
        }

        let mut runner = Self::with_connector(sync_config, builder.build()?, JiraConnector);
        runner.repo = config.repo().map(str::to_string);
        Ok(runner)
    }
}

impl<C: TrackerConnector> Runner<C> {
    /// Builds a runner around an already loaded config and tracker connector.
    pub fn with_connector(config: SyncConfig, octocrab: Octocrab, connector: C) -> Self {
        Self {
            config,
            octocrab,
            connector,
            repo: None,
        }
    }

    /// Returns the sync config in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Syncs every open item of every mapped GitHub project.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the project filter names an
    /// unmapped project. Fetch and item failures are recorded in the
    /// summary instead.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(self.config.testing);

        if let Some(repo) = &self.repo {
            self.config.route(UpstreamSource::Github, repo)?;
        }

        let routes: Vec<(&str, &Route)> = self
            .config
            .routes(UpstreamSource::Github)
            .filter(|(project, _)| self.repo.as_deref().map_or(true, |repo| repo == *project))
            .collect();

        if routes.is_empty() {
            warn!("No GitHub projects mapped");
            return Ok(summary);
        }

        info!(count = routes.len(), "Syncing projects");
        for (project, route) in routes {
            if route.syncs(SyncKind::Issue) {
                self.sync_issues(project, route, &mut summary).await;
            }
            if route.syncs(SyncKind::PullRequest) {
                self.sync_pull_requests(project, route, &mut summary).await;
            }
        }

        Ok(summary)
    }

    async fn sync_issues(&self, project: &str, route: &Route, summary: &mut RunSummary) {
        let issues = match fetch_issues(&self.octocrab, project).await {
            Ok(issues) => issues,
            Err(e) => {
                error!(project, error = %e, "Failed to fetch issues");
                summary.record_fetch_failure();
                return;
            }
        };

        for payload in issues {
            let mut issue =
                Issue::with_route(UpstreamSource::Github, project, payload, route.clone());
            let result = sync_issue(&mut issue, &self.config, &self.connector).await;
            summary.record_result(&log_result(ProcessingResult::from_sync(&issue.url, result)));
        }
    }

    async fn sync_pull_requests(&self, project: &str, route: &Route, summary: &mut RunSummary) {
        let pull_requests = match fetch_pull_requests(&self.octocrab, project).await {
            Ok(pull_requests) => pull_requests,
            Err(e) => {
                error!(project, error = %e, "Failed to fetch pull requests");
                summary.record_fetch_failure();
                return;
            }
        };

        for payload in pull_requests {
            let pr = PullRequest::with_route(
                UpstreamSource::Github,
                project,
                payload,
                PrEvent::Opened,
                route.clone(),
            );
            let result = sync_pull_request(&pr, &self.config, &self.connector).await;
            summary.record_result(&log_result(ProcessingResult::from_sync(&pr.url, result)));
        }
    }

    /// Processes a single webhook payload.
    ///
    /// Payloads that are not about an issue or pull request, or whose
    /// project or item kind is not synced, leave the summary empty.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Upstream`] if the payload cannot be decoded.
    pub async fn handle_event(&self, payload: &[u8]) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(self.config.testing);

        let Some(event) = parse_event(payload)? else {
            info!("Ignoring webhook payload");
            return Ok(summary);
        };

        let Some(route) = event.route(&self.config) else {
            info!(project = event.project(), kind = ?event.kind(), "Project not synced, ignoring event");
            return Ok(summary);
        };
        let route = route.clone();

        let result = match event {
            UpstreamEvent::PullRequest {
                project,
                mut pull_request,
                event,
            } => {
                let item = pull_request.html_url.clone();
                match fetch_comments(&self.octocrab, &project, pull_request.number).await {
                    Ok(comments) => {
                        pull_request.comments = comments;
                        let pr = PullRequest::with_route(
                            UpstreamSource::Github,
                            &project,
                            pull_request,
                            event,
                            route,
                        );
                        let result = sync_pull_request(&pr, &self.config, &self.connector).await;
                        ProcessingResult::from_sync(&item, result)
                    }
                    Err(e) => ProcessingResult::Failed {
                        item,
                        error: e.to_string(),
                    },
                }
            }
            UpstreamEvent::Issue { project, mut issue } => {
                let item = issue.html_url.clone();
                match fetch_comments(&self.octocrab, &project, issue.number).await {
                    Ok(comments) => {
                        issue.comments = comments;
                        let mut issue =
                            Issue::with_route(UpstreamSource::Github, &project, issue, route);
                        let result = sync_issue(&mut issue, &self.config, &self.connector).await;
                        ProcessingResult::from_sync(&item, result)
                    }
                    Err(e) => ProcessingResult::Failed {
                        item,
                        error: e.to_string(),
                    },
                }
            }
        };

        summary.record_result(&log_result(result));
        Ok(summary)
    }
}

fn log_result(result: ProcessingResult) -> ProcessingResult {
    match &result {
        ProcessingResult::Synced { item, report } => info!(
            item = %item,
            tickets = report.updated.len(),
            "Item synced"
        ),
        ProcessingResult::Skipped { item, reason } => info!(item = %item, reason = %reason, "Item skipped"),
        ProcessingResult::Failed { item, error } => error!(item = %item, error = %error, "Item failed"),
    }
    result
}
