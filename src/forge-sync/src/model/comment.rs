//! Normalized item comments.

use super::User;
use crate::normalize::trim_comment_body;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An upstream comment in the forge-neutral payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamComment {
    /// Forge comment id.
    pub id: u64,

    /// Comment author.
    pub user: User,

    /// Raw comment body.
    #[serde(default)]
    pub body: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A comment attached to an intermediary item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Display name of the author.
    pub author: String,

    /// Login of the author.
    pub name: String,

    /// Body, capped at the tracker comment limit.
    pub body: String,

    /// Forge comment id.
    pub id: u64,

    /// Creation time.
    pub date_created: DateTime<Utc>,

    /// Set by update detection; always unset on construction.
    pub changed: Option<DateTime<Utc>>,
}

impl From<UpstreamComment> for Comment {
    fn from(comment: UpstreamComment) -> Self {
        Self {
            author: comment.user.display_name().to_string(),
            body: trim_comment_body(&comment.body),
            name: comment.user.login,
            id: comment.id,
            date_created: comment.created_at,
            changed: None,
        }
    }
}
