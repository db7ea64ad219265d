//! What a reconciliation did.

use serde::Serialize;

/// How the reconciliation of one item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Testing mode; the tracker was not contacted.
    DryRun,
    /// The item references no ticket keys.
    NoCandidates,
    /// Every candidate key was abandoned.
    Unresolved,
    /// At least one ticket was reconciled.
    Synced,
}

/// Why a candidate key was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbandonReason {
    /// The key matched no ticket.
    NotFound,
    /// The key matched more than one ticket.
    Ambiguous {
        /// Number of tickets returned.
        count: usize,
    },
    /// The lookup itself failed.
    QueryFailed {
        /// Error message.
        message: String,
    },
}

/// A candidate key that did not resolve to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbandonedCandidate {
    /// Candidate key.
    pub key: String,
    /// Why it was dropped.
    #[serde(flatten)]
    pub reason: AbandonReason,
}

/// Changes made to one resolved ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TicketUpdate {
    /// Ticket key.
    pub key: String,
    /// A remote link to the item was attached.
    pub link_attached: bool,
    /// The event comment was added.
    pub comment_added: bool,
    /// Status names the ticket was moved to.
    pub transitions: Vec<String>,
    /// The ticket was created for the item.
    pub created: bool,
    /// Upstream comments added or edited on the ticket.
    pub comments_mirrored: usize,
    /// Ticket fields rewritten from the item.
    pub fields: Vec<String>,
}

/// Result of reconciling one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// How it ended.
    pub outcome: SyncOutcome,
    /// Tickets that were reconciled, in key order.
    pub updated: Vec<TicketUpdate>,
    /// Candidates that were dropped, in key order.
    pub abandoned: Vec<AbandonedCandidate>,
}

impl SyncReport {
    pub(crate) fn new(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            updated: Vec::new(),
            abandoned: Vec::new(),
        }
    }

    /// Number of remote links attached.
    #[must_use]
    pub fn links_attached(&self) -> usize {
        self.updated.iter().filter(|u| u.link_attached).count()
    }

    /// Number of comments added.
    #[must_use]
    pub fn comments_added(&self) -> usize {
        self.updated.iter().filter(|u| u.comment_added).count()
    }

    /// Number of transitions applied.
    #[must_use]
    pub fn transitions_applied(&self) -> usize {
        self.updated.iter().map(|u| u.transitions.len()).sum()
    }

    /// Number of tickets created.
    #[must_use]
    pub fn tickets_created(&self) -> usize {
        self.updated.iter().filter(|u| u.created).count()
    }

    /// Number of upstream comments mirrored.
    #[must_use]
    pub fn comments_mirrored(&self) -> usize {
        self.updated.iter().map(|u| u.comments_mirrored).sum()
    }

    /// Number of ticket fields rewritten.
    #[must_use]
    pub fn fields_updated(&self) -> usize {
        self.updated.iter().map(|u| u.fields.len()).sum()
    }

    /// Whether any ticket was mutated.
    #[must_use]
    pub fn changed_anything(&self) -> bool {
        self.links_attached()
            + self.comments_added()
            + self.transitions_applied()
            + self.tickets_created()
            + self.comments_mirrored()
            + self.fields_updated()
            > 0
    }
}
