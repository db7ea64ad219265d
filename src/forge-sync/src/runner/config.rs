//! Runner configuration.

use std::path::{Path, PathBuf};

/// Configuration for a sync run.
#[derive(Clone)]
pub struct RunnerConfig {
    /// Path to the sync config file.
    config_path: PathBuf,
    /// GitHub token used for API calls.
    token: Option<String>,
    /// Forces testing mode on top of the config file.
    testing: bool,
    /// Restricts a full sync to one upstream project.
    repo: Option<String>,
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("config_path", &self.config_path)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("testing", &self.testing)
            .field("repo", &self.repo)
            .finish()
    }
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(config_path: PathBuf, token: Option<String>, testing: bool) -> Self {
        Self {
            config_path,
            token,
            testing,
            repo: None,
        }
    }

    /// Restricts the run to a single `owner/name` project.
    pub fn with_repo(mut self, repo: Option<String>) -> Self {
        self.repo = repo;
        self
    }

    /// Returns the sync config file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the configured GitHub token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns whether testing mode is forced.
    pub fn testing(&self) -> bool {
        self.testing
    }

    /// Returns the project filter.
    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let config = RunnerConfig::new(PathBuf::from("sync.toml"), Some("ghp_secret".into()), false)
            .with_repo(Some("org/repo".into()));
        let debug = format!("{config:?}");

        assert!(!debug.contains("ghp_secret"));
        assert_eq!(config.repo(), Some("org/repo"));
    }
}
