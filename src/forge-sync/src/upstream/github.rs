//! Fetching open issues and pull requests from GitHub.

use super::rate_limit::ensure_core_rate_limit;
use super::UpstreamError;
use crate::model::{IssueStatus, UpstreamComment, UpstreamIssue, UpstreamPullRequest, User};
use octocrab::models::issues::Comment as GitHubComment;
use octocrab::models::{Author, IssueState};
use octocrab::{params, Octocrab, Page};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, info_span, warn, Instrument};

/// Results per page for list calls.
const RESULTS_PER_PAGE: u8 = 100;

/// The part of a user profile we read.
#[derive(Deserialize)]
struct Profile {
    #[serde(default)]
    name: Option<String>,
}

/// Resolves logins to display names, once per login per fetch.
struct Directory<'a> {
    octocrab: &'a Octocrab,
    names: HashMap<String, Option<String>>,
}

impl<'a> Directory<'a> {
    fn new(octocrab: &'a Octocrab) -> Self {
        Self {
            octocrab,
            names: HashMap::new(),
        }
    }

    async fn user(&mut self, author: &Author) -> User {
        let login = author.login.clone();
        if let Some(name) = self.names.get(&login) {
            return User {
                login,
                name: name.clone(),
            };
        }

        let name = match self.profile(&login).await {
            Ok(profile) => profile.name,
            Err(e) => {
                warn!(login = %login, error = %e, "Could not fetch user profile, using login");
                None
            }
        };

        self.names.insert(login.clone(), name.clone());
        User { login, name }
    }

    async fn users(&mut self, authors: &[Author]) -> Vec<User> {
        let mut users = Vec::with_capacity(authors.len());
        for author in authors {
            users.push(self.user(author).await);
        }
        users
    }

    async fn profile(&self, login: &str) -> Result<Profile, octocrab::Error> {
        ensure_core_rate_limit(self.octocrab).await?;
        self.octocrab
            .get::<Profile, _, ()>(format!("/users/{login}"), None)
            .await
    }
}

/// Splits `owner/name`.
pub(crate) fn split_project(project: &str) -> Result<(&str, &str), UpstreamError> {
    project
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| UpstreamError::InvalidProject {
            project: project.to_string(),
        })
}

/// Drains every remaining page after `first`, checking the quota in between.
async fn collect_pages<T: DeserializeOwned>(
    octocrab: &Octocrab,
    first: Page<T>,
) -> Result<Vec<T>, UpstreamError> {
    let mut items = first.items;
    let mut next = first.next;

    while next.is_some() {
        ensure_core_rate_limit(octocrab).await?;
        match octocrab.get_page::<T>(&next).await? {
            Some(page) => {
                items.extend(page.items);
                next = page.next;
            }
            None => break,
        }
    }

    Ok(items)
}

/// Lists every comment on an issue or pull request.
///
/// # Errors
///
/// Returns [`UpstreamError`] if the project name is invalid or the API call
/// fails.
pub async fn fetch_comments(
    octocrab: &Octocrab,
    project: &str,
    number: u64,
) -> Result<Vec<UpstreamComment>, UpstreamError> {
    let mut directory = Directory::new(octocrab);
    comments_with(&mut directory, project, number).await
}

async fn comments_with(
    directory: &mut Directory<'_>,
    project: &str,
    number: u64,
) -> Result<Vec<UpstreamComment>, UpstreamError> {
    let (owner, repo) = split_project(project)?;
    let octocrab = directory.octocrab;

    ensure_core_rate_limit(octocrab).await?;
    let first = octocrab
        .issues(owner, repo)
        .list_comments(number)
        .per_page(RESULTS_PER_PAGE)
        .send()
        .await?;
    let raw: Vec<GitHubComment> = collect_pages(octocrab, first).await?;

    let mut comments = Vec::with_capacity(raw.len());
    for comment in raw {
        comments.push(UpstreamComment {
            id: comment.id.into_inner(),
            user: directory.user(&comment.user).await,
            body: comment.body.unwrap_or_default(),
            created_at: comment.created_at,
        });
    }
    Ok(comments)
}

/// Fetches the open issues of a project, excluding pull requests.
///
/// # Errors
///
/// Returns [`UpstreamError`] if the project name is invalid or any API call
/// fails.
pub async fn fetch_issues(
    octocrab: &Octocrab,
    project: &str,
) -> Result<Vec<UpstreamIssue>, UpstreamError> {
    let span = info_span!("fetch_issues", project = %project);

    async {
        let (owner, repo) = split_project(project)?;
        let mut directory = Directory::new(octocrab);

        ensure_core_rate_limit(octocrab).await?;
        let first = octocrab
            .issues(owner, repo)
            .list()
            .state(params::State::Open)
            .per_page(RESULTS_PER_PAGE)
            .send()
            .await?;
        let raw = collect_pages(octocrab, first).await?;

        let mut issues = Vec::new();
        for issue in raw.into_iter().filter(|issue| issue.pull_request.is_none()) {
            let comments = if issue.comments > 0 {
                comments_with(&mut directory, project, issue.number).await?
            } else {
                Vec::new()
            };

            issues.push(UpstreamIssue {
                id: issue.id.into_inner(),
                number: issue.number,
                title: issue.title,
                html_url: issue.html_url.to_string(),
                body: issue.body,
                state: match issue.state {
                    IssueState::Closed => IssueStatus::Closed,
                    _ => IssueStatus::Open,
                },
                labels: issue.labels.into_iter().map(|label| label.name).collect(),
                milestone: issue.milestone.map(|milestone| milestone.title),
                user: directory.user(&issue.user).await,
                assignees: directory.users(&issue.assignees).await,
                comments,
            });
        }

        info!(count = issues.len(), "Fetched open issues");
        Ok(issues)
    }
    .instrument(span)
    .await
}

/// Fetches the open pull requests of a project.
///
/// # Errors
///
/// Returns [`UpstreamError`] if the project name is invalid or any API call
/// fails.
pub async fn fetch_pull_requests(
    octocrab: &Octocrab,
    project: &str,
) -> Result<Vec<UpstreamPullRequest>, UpstreamError> {
    let span = info_span!("fetch_pull_requests", project = %project);

    async {
        let (owner, repo) = split_project(project)?;
        let mut directory = Directory::new(octocrab);

        ensure_core_rate_limit(octocrab).await?;
        let first = octocrab
            .pulls(owner, repo)
            .list()
            .state(params::State::Open)
            .per_page(RESULTS_PER_PAGE)
            .send()
            .await?;
        let raw = collect_pages(octocrab, first).await?;

        let mut pull_requests = Vec::new();
        for pr in raw {
            let Some(author) = pr.user.as_deref() else {
                debug!(number = pr.number, "Skipping pull request without author");
                continue;
            };
            let Some(html_url) = pr.html_url.as_ref() else {
                debug!(number = pr.number, "Skipping pull request without url");
                continue;
            };

            pull_requests.push(UpstreamPullRequest {
                number: pr.number,
                title: pr.title.clone().unwrap_or_default(),
                html_url: html_url.to_string(),
                body: pr.body.clone(),
                labels: pr
                    .labels
                    .iter()
                    .flatten()
                    .map(|label| label.name.clone())
                    .collect(),
                milestone: pr.milestone.as_ref().map(|milestone| milestone.title.clone()),
                user: directory.user(author).await,
                assignees: directory
                    .users(pr.assignees.as_deref().unwrap_or_default())
                    .await,
                comments: comments_with(&mut directory, project, pr.number).await?,
            });
        }

        info!(count = pull_requests.len(), "Fetched open pull requests");
        Ok(pull_requests)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_project() {
        assert_eq!(split_project("org/repo").unwrap(), ("org", "repo"));
    }

    #[test]
    fn rejects_malformed_project() {
        for project in ["repo", "/repo", "org/", "org/repo/extra"] {
            assert!(
                matches!(
                    split_project(project),
                    Err(UpstreamError::InvalidProject { .. })
                ),
                "{project} should be rejected"
            );
        }
    }
}
