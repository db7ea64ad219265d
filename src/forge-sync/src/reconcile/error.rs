//! Reconciliation error types.

use crate::config::ConfigError;
use crate::templates::TemplateError;
use crate::tracker::TrackerError;

/// Error that aborts the reconciliation of one item.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The item's route or tracker could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tracker failed while a resolved ticket was being updated.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// The ticket comment could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
