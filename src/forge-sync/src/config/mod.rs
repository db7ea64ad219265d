//! Sync configuration loading.
//!
//! This module parses the sync TOML file into a typed routing table and
//! validates it up front, so a misconfigured project fails at load time
//! rather than halfway through a run.
//!
//! ```toml
//! testing = false
//! default-tracker = "main"
//!
//! [trackers.main]
//! url = "https://issues.example.com"
//!
//! [map.github."org/repo"]
//! project = "FACTORY"
//! sync = ["issue", "pullrequest"]
//! fix-version = "FACTORY XXX"
//!
//! [map.github."org/repo".pr-updates]
//! merge-transition = "Closed"
//! link-transition = "In Progress"
//!
//! [map.github."org/repo".issue-updates]
//! comments = true
//! tags = { overwrite = false }
//! transition = "Closed"
//!
//! [users.octocat]
//! account-id = "557058:abcd"
//! ```

mod error;
mod route;
mod tracker;

pub use error::ConfigError;
pub use route::{
    FieldSync, IssueUpdates, OnClose, PrUpdates, Route, StatusSync, SyncKind, UpstreamSource,
};
pub use tracker::{TrackerInstance, UserMapping};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Forces testing mode when set to `1` or `true`.
pub const TESTING_ENV: &str = "FORGE_SYNC_TESTING";

/// Fallback tracker username for instances that do not set one.
pub const TRACKER_USERNAME_ENV: &str = "FORGE_SYNC_TRACKER_USERNAME";

/// Fallback tracker token for instances that do not set one.
pub const TRACKER_TOKEN_ENV: &str = "FORGE_SYNC_TRACKER_TOKEN";

/// Parsed and validated sync configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SyncConfig {
    /// When set, nothing is written to the tracker.
    #[serde(default)]
    pub testing: bool,

    /// Tracker instance used by routes that do not name one.
    pub default_tracker: Option<String>,

    /// Tracker instances by name.
    #[serde(default)]
    pub trackers: BTreeMap<String, TrackerInstance>,

    /// Routing table: forge name -> upstream project -> route.
    #[serde(default)]
    map: BTreeMap<String, BTreeMap<String, Route>>,

    /// Upstream login -> tracker identity.
    #[serde(default)]
    pub users: BTreeMap<String, UserMapping>,
}

impl SyncConfig {
    /// Loads and validates the config file at `path`.
    ///
    /// Environment overrides ([`TESTING_ENV`], [`TRACKER_USERNAME_ENV`],
    /// [`TRACKER_TOKEN_ENV`]) are applied after parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, not valid
    /// TOML, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading sync config");

        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut config = Self::parse(&content, &path.display().to_string())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses and validates config content.
    ///
    /// `origin` only labels errors. No environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on TOML or validation failures.
    pub fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlError {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate(origin)?;

        debug!(
            routes = config.map.values().map(BTreeMap::len).sum::<usize>(),
            trackers = config.trackers.len(),
            "Parsed sync config"
        );
        Ok(config)
    }

    /// Checks that every route can actually be served.
    fn validate(&self, origin: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            path: origin.to_string(),
            message,
        };

        for (name, instance) in &self.trackers {
            url::Url::parse(&instance.url)
                .map_err(|e| invalid(format!("tracker '{name}' has an invalid url: {e}")))?;
        }

        if let Some(default) = &self.default_tracker {
            if !self.trackers.contains_key(default) {
                return Err(invalid(format!(
                    "default-tracker '{default}' is not a configured tracker"
                )));
            }
        }

        for (source, routes) in &self.map {
            source.parse::<UpstreamSource>().map_err(|_| {
                let possible: Vec<&str> =
                    UpstreamSource::ALL.iter().map(|s| s.as_str()).collect();
                invalid(format!(
                    "map section '{source}' must be one of: {}",
                    possible.join(", ")
                ))
            })?;

            for (upstream, route) in routes {
                if route.project.trim().is_empty() {
                    return Err(invalid(format!(
                        "route {source}/{upstream} has an empty project"
                    )));
                }
                if self.tracker_for(route).is_err() {
                    return Err(invalid(format!(
                        "route {source}/{upstream} has no usable tracker instance"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(TESTING_ENV) {
            if matches!(value.trim(), "1" | "true" | "TRUE" | "True") {
                info!("Testing mode forced by {TESTING_ENV}");
                self.testing = true;
            }
        }

        let username = std::env::var(TRACKER_USERNAME_ENV).ok();
        let token = std::env::var(TRACKER_TOKEN_ENV).ok();
        for instance in self.trackers.values_mut() {
            if instance.username.is_none() {
                instance.username.clone_from(&username);
            }
            if instance.token.is_none() {
                instance.token.clone_from(&token);
            }
        }
    }

    /// Looks up the route for an upstream project.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRoute`] if the project is not mapped.
    pub fn route(&self, source: UpstreamSource, upstream: &str) -> Result<&Route, ConfigError> {
        self.map
            .get(source.as_str())
            .and_then(|routes| routes.get(upstream))
            .ok_or_else(|| ConfigError::MissingRoute {
                forge: source.to_string(),
                upstream: upstream.to_string(),
            })
    }

    /// Iterates over every mapped project of a forge.
    pub fn routes(&self, source: UpstreamSource) -> impl Iterator<Item = (&str, &Route)> {
        self.map
            .get(source.as_str())
            .into_iter()
            .flat_map(|routes| routes.iter().map(|(name, route)| (name.as_str(), route)))
    }

    /// Resolves the tracker instance a route writes to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTracker`] if neither the route nor the
    /// default names a configured instance.
    pub fn tracker_for(&self, route: &Route) -> Result<&TrackerInstance, ConfigError> {
        let name = route
            .tracker
            .as_deref()
            .or(self.default_tracker.as_deref())
            .unwrap_or_default();
        self.trackers
            .get(name)
            .ok_or_else(|| ConfigError::MissingTracker {
                name: name.to_string(),
            })
    }

    /// Returns the tracker account id mapped to an upstream login.
    #[must_use]
    pub fn account_id(&self, login: &str) -> Option<&str> {
        self.users.get(login).map(|user| user.account_id.as_str())
    }
}
