//! Intermediary model of upstream items.
//!
//! Forge payloads are converted into [`Issue`] and [`PullRequest`] values
//! once per fetch. Content is scrubbed, comments are capped, and the route
//! each item lands on is resolved during construction.

mod comment;
mod event;
mod issue;
mod pull_request;
mod status;
mod user;

pub use comment::{Comment, UpstreamComment};
pub use event::PrEvent;
pub use issue::{Issue, UpstreamIssue};
pub use pull_request::{PullRequest, UpstreamPullRequest};
pub use status::IssueStatus;
pub use user::User;
