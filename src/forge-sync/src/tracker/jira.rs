//! Jira REST client.
//!
//! Wraps the handful of Jira REST v2 endpoints the reconciliation engine
//! uses. Authentication is basic auth when both a username and token are
//! configured, a bearer token when only the token is, and anonymous
//! otherwise.

use super::{
    FieldUpdate, NewTicket, RemoteLink, Ticket, TicketComment, TicketFields, TrackerClient,
    TrackerConnector, TrackerError,
};
use crate::config::TrackerInstance;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Page size used for paged listings.
const PAGE_SIZE: u32 = 50;

/// Fields requested when reading a ticket for mirroring.
const MIRRORED_FIELDS: &str = "summary,description,labels,fixVersions,assignee,status";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Ticket>,
}

#[derive(Deserialize)]
struct RemoteLinkEntry {
    object: RemoteLink,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentPage {
    #[serde(default)]
    comments: Vec<TicketComment>,
    #[serde(default)]
    total: u32,
}

#[derive(Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<super::Transition>,
}

#[derive(Deserialize)]
struct IssueResponse {
    fields: RawFields,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    fix_versions: Vec<Named>,
    #[serde(default)]
    assignee: Option<Account>,
    #[serde(default)]
    status: Option<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

/// Cloud instances identify users by `accountId`, server instances by `name`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawFields> for TicketFields {
    fn from(raw: RawFields) -> Self {
        Self {
            summary: raw.summary,
            description: raw.description,
            labels: raw.labels,
            fix_versions: raw.fix_versions.into_iter().map(|v| v.name).collect(),
            assignee: raw.assignee.and_then(|a| a.account_id.or(a.name)),
            status: raw.status.map(|s| s.name).unwrap_or_default(),
        }
    }
}

/// Builds the `fields` object of an update request.
fn update_body(update: &FieldUpdate) -> Value {
    let mut fields = Map::new();
    if let Some(summary) = &update.summary {
        fields.insert("summary".to_string(), json!(summary));
    }
    if let Some(description) = &update.description {
        fields.insert("description".to_string(), json!(description));
    }
    if let Some(labels) = &update.labels {
        fields.insert("labels".to_string(), json!(labels));
    }
    if let Some(versions) = &update.fix_versions {
        let versions: Vec<Value> = versions.iter().map(|name| json!({ "name": name })).collect();
        fields.insert("fixVersions".to_string(), Value::Array(versions));
    }
    if let Some(assignee) = &update.assignee {
        let value = match assignee {
            Some(id) => json!({ "accountId": id }),
            None => Value::Null,
        };
        fields.insert("assignee".to_string(), value);
    }
    json!({ "fields": fields })
}

/// HTTP client for one Jira instance.
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    username: Option<String>,
    token: Option<String>,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    /// Creates a client for a tracker instance.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidUrl`] if the instance url does not
    /// parse, or [`TrackerError::Http`] if the HTTP client cannot be built.
    pub fn new(instance: &TrackerInstance) -> Result<Self, TrackerError> {
        url::Url::parse(&instance.url).map_err(|e| TrackerError::InvalidUrl {
            url: instance.url.clone(),
            source: e,
        })?;

        let http = Client::builder()
            .user_agent(concat!("forge-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: instance.url.trim_end_matches('/').to_string(),
            username: instance.username.clone(),
            token: instance.token.clone(),
        })
    }

    /// Builds an authenticated request against a REST path.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/rest/api/2/{path}", self.base_url);
        debug!(%method, %url, "Tracker request");

        let builder = self.http.request(method, url);
        match (&self.username, &self.token) {
            (Some(username), Some(token)) => builder.basic_auth(username, Some(token)),
            (None, Some(token)) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    /// Turns a non-success response into [`TrackerError::Api`].
    async fn check(response: Response) -> Result<Response, TrackerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TrackerClient for JiraClient {
    async fn search_tickets(&self, query: &str) -> Result<Vec<Ticket>, TrackerError> {
        let response = self
            .request(Method::GET, "search")
            .query(&[("jql", query), ("fields", "summary")])
            .send()
            .await?;

        let page: SearchResponse = Self::check(response).await?.json().await?;
        Ok(page.issues)
    }

    async fn remote_links(&self, key: &str) -> Result<Vec<RemoteLink>, TrackerError> {
        let response = self
            .request(Method::GET, &format!("issue/{key}/remotelink"))
            .send()
            .await?;

        let entries: Vec<RemoteLinkEntry> = Self::check(response).await?.json().await?;
        Ok(entries.into_iter().map(|entry| entry.object).collect())
    }

    async fn attach_remote_link(&self, key: &str, link: &RemoteLink) -> Result<(), TrackerError> {
        let response = self
            .request(Method::POST, &format!("issue/{key}/remotelink"))
            .json(&json!({ "object": link }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn comments(&self, key: &str) -> Result<Vec<TicketComment>, TrackerError> {
        let mut comments: Vec<TicketComment> = Vec::new();
        let page_size = PAGE_SIZE.to_string();

        loop {
            let start_at = comments.len().to_string();
            let response = self
                .request(Method::GET, &format!("issue/{key}/comment"))
                .query(&[
                    ("startAt", start_at.as_str()),
                    ("maxResults", page_size.as_str()),
                ])
                .send()
                .await?;

            let page: CommentPage = Self::check(response).await?.json().await?;
            let fetched = page.comments.len();
            comments.extend(page.comments);

            if fetched == 0 || comments.len() >= page.total as usize {
                break;
            }
        }

        Ok(comments)
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        let response = self
            .request(Method::POST, &format!("issue/{key}/comment"))
            .json(&json!({ "body": body }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update_comment(
        &self,
        key: &str,
        comment_id: &str,
        body: &str,
    ) -> Result<(), TrackerError> {
        let response = self
            .request(Method::PUT, &format!("issue/{key}/comment/{comment_id}"))
            .json(&json!({ "body": body }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn ticket_fields(&self, key: &str) -> Result<TicketFields, TrackerError> {
        let response = self
            .request(Method::GET, &format!("issue/{key}"))
            .query(&[("fields", MIRRORED_FIELDS)])
            .send()
            .await?;

        let issue: IssueResponse = Self::check(response).await?.json().await?;
        Ok(issue.fields.into())
    }

    async fn update_fields(&self, key: &str, update: &FieldUpdate) -> Result<(), TrackerError> {
        let response = self
            .request(Method::PUT, &format!("issue/{key}"))
            .json(&update_body(update))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, TrackerError> {
        let body = json!({
            "fields": {
                "project": { "key": ticket.project },
                "summary": ticket.summary,
                "description": ticket.description,
                "issuetype": { "name": ticket.issue_type },
                "labels": ticket.labels,
            }
        });
        let response = self
            .request(Method::POST, "issue")
            .json(&body)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn transitions(&self, key: &str) -> Result<Vec<super::Transition>, TrackerError> {
        let response = self
            .request(Method::GET, &format!("issue/{key}/transitions"))
            .send()
            .await?;

        let page: TransitionsResponse = Self::check(response).await?.json().await?;
        Ok(page.transitions)
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        let response = self
            .request(Method::POST, &format!("issue/{key}/transitions"))
            .json(&json!({ "transition": { "id": transition_id } }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

/// Connects to Jira instances over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct JiraConnector;

impl TrackerConnector for JiraConnector {
    type Client = JiraClient;

    fn connect(&self, instance: &TrackerInstance) -> Result<JiraClient, TrackerError> {
        JiraClient::new(instance)
    }
}
