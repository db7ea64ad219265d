//! Runner error types.

/// Errors that stop a run as a whole.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Sync config loading errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// Webhook payload errors.
    #[error(transparent)]
    Upstream(#[from] crate::upstream::UpstreamError),
}
