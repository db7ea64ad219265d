//! Upstream forge access.
//!
//! Fetches open items from GitHub into the forge-neutral payload types in
//! [`crate::model`], and decodes webhook deliveries into [`UpstreamEvent`]s.

mod error;
mod event;
mod github;
mod rate_limit;

pub use error::UpstreamError;
pub use event::{parse_event, UpstreamEvent};
pub use github::{fetch_comments, fetch_issues, fetch_pull_requests};
pub use rate_limit::{check_core_rate_limit, ensure_core_rate_limit, RateLimitInfo};
