//! Upstream forge error types.

use thiserror::Error;

/// Errors fetching or decoding upstream items.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// A project name is not of the form `owner/name`.
    #[error("Invalid project name '{project}', expected 'owner/name'")]
    InvalidProject {
        /// Project name as given.
        project: String,
    },

    /// A webhook payload is not valid JSON of the expected shape.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
