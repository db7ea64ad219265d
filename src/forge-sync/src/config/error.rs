//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or querying the sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse sync config '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Validation error in the config.
    #[error("Validation error in '{path}': {message}")]
    ValidationError { path: String, message: String },

    /// Missing required file.
    #[error("Missing required file: {path}")]
    MissingFile { path: String },

    /// No routing entry exists for an upstream project.
    #[error("No route configured for {forge} project '{upstream}'")]
    MissingRoute { forge: String, upstream: String },

    /// A route points at a tracker instance that is not configured.
    #[error("No tracker instance named '{name}' is configured")]
    MissingTracker { name: String },
}
