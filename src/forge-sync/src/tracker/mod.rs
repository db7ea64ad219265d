//! Downstream ticket tracker.
//!
//! The reconciliation engine only talks to the tracker through
//! [`TrackerClient`], and only obtains one through a [`TrackerConnector`]
//! once it knows there is something to write. [`JiraClient`] is the
//! production implementation.

mod error;
mod jira;

pub use error::TrackerError;
pub use jira::{JiraClient, JiraConnector};

use crate::config::TrackerInstance;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A ticket returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ticket {
    /// Human-facing key, e.g. `FACTORY-12`.
    pub key: String,

    /// Tracker-internal id.
    #[serde(default)]
    pub id: String,
}

/// A remote link attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLink {
    /// Link target.
    pub url: String,

    /// Link text.
    #[serde(default)]
    pub title: String,
}

/// A comment on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TicketComment {
    /// Tracker-internal comment id.
    #[serde(default)]
    pub id: String,

    /// Comment text.
    #[serde(default)]
    pub body: String,
}

/// The ticket fields issue mirroring reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TicketFields {
    /// Summary line.
    pub summary: String,

    /// Description, if any.
    pub description: Option<String>,

    /// Label names.
    pub labels: Vec<String>,

    /// Fix version names.
    pub fix_versions: Vec<String>,

    /// Assignee account id.
    pub assignee: Option<String>,

    /// Current status name.
    pub status: String,
}

/// A partial field update; unset members are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldUpdate {
    /// New summary.
    pub summary: Option<String>,

    /// New description.
    pub description: Option<String>,

    /// New label set.
    pub labels: Option<Vec<String>>,

    /// New fix version names.
    pub fix_versions: Option<Vec<String>>,

    /// New assignee; `Some(None)` unassigns.
    pub assignee: Option<Option<String>>,
}

impl FieldUpdate {
    /// Returns true if nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed().is_empty()
    }

    /// Names of the fields this update touches.
    #[must_use]
    pub fn changed(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.summary.is_some() {
            fields.push("summary");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.labels.is_some() {
            fields.push("labels");
        }
        if self.fix_versions.is_some() {
            fields.push("fixVersions");
        }
        if self.assignee.is_some() {
            fields.push("assignee");
        }
        fields
    }
}

/// A ticket to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Project key.
    pub project: String,

    /// Summary line.
    pub summary: String,

    /// Description.
    pub description: String,

    /// Issue type name, e.g. `Bug`.
    pub issue_type: String,

    /// Label names.
    pub labels: Vec<String>,
}

/// A workflow transition available on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transition {
    /// Transition id, used to apply it.
    pub id: String,

    /// Transition name, e.g. `Done`.
    pub name: String,
}

/// Operations the reconciliation engine needs from a tracker.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Runs a query and returns the matching tickets.
    async fn search_tickets(&self, query: &str) -> Result<Vec<Ticket>, TrackerError>;

    /// Lists the remote links attached to a ticket.
    async fn remote_links(&self, key: &str) -> Result<Vec<RemoteLink>, TrackerError>;

    /// Attaches a remote link to a ticket.
    async fn attach_remote_link(&self, key: &str, link: &RemoteLink) -> Result<(), TrackerError>;

    /// Lists every comment on a ticket.
    async fn comments(&self, key: &str) -> Result<Vec<TicketComment>, TrackerError>;

    /// Adds a comment to a ticket.
    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError>;

    /// Replaces the body of an existing comment.
    async fn update_comment(
        &self,
        key: &str,
        comment_id: &str,
        body: &str,
    ) -> Result<(), TrackerError>;

    /// Reads the fields issue mirroring compares against.
    async fn ticket_fields(&self, key: &str) -> Result<TicketFields, TrackerError>;

    /// Writes a partial field update.
    async fn update_fields(&self, key: &str, update: &FieldUpdate) -> Result<(), TrackerError>;

    /// Creates a ticket and returns its handle.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, TrackerError>;

    /// Lists the transitions currently available on a ticket.
    async fn transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError>;

    /// Applies a transition by id.
    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError>;

    /// Moves a ticket through the transition named `status`.
    ///
    /// The name comparison ignores case.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Transition`] if no available transition has
    /// that name, or any error from the underlying calls.
    async fn change_status(&self, key: &str, status: &str) -> Result<(), TrackerError> {
        let wanted = status.to_lowercase();
        let transitions = self.transitions(key).await?;

        let Some(transition) = transitions
            .iter()
            .find(|transition| transition.name.to_lowercase() == wanted)
        else {
            warn!(key, status, "No matching transition on ticket");
            return Err(TrackerError::Transition {
                key: key.to_string(),
                status: status.to_string(),
            });
        };

        self.apply_transition(key, &transition.id).await?;
        info!(key, status = %transition.name, "Transitioned ticket");
        Ok(())
    }
}

/// Produces a [`TrackerClient`] for a configured tracker instance.
pub trait TrackerConnector: Send + Sync {
    /// Client type handed out.
    type Client: TrackerClient;

    /// Connects to `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError`] if a client cannot be built.
    fn connect(&self, instance: &TrackerInstance) -> Result<Self::Client, TrackerError>;
}
