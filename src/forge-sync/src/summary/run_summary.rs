//! Run summary types.

use super::result::ProcessingResult;

/// Summary of a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of items processed.
    pub items_processed: usize,

    /// Number of tickets reconciled.
    pub tickets_updated: usize,

    /// Number of remote links attached.
    pub links_attached: usize,

    /// Number of comments added.
    pub comments_added: usize,

    /// Number of transitions applied.
    pub transitions_applied: usize,

    /// Number of tickets created.
    pub tickets_created: usize,

    /// Number of upstream comments mirrored.
    pub comments_mirrored: usize,

    /// Number of ticket fields rewritten.
    pub fields_updated: usize,

    /// Number of items skipped.
    pub items_skipped: usize,

    /// Number of items that failed.
    pub items_failed: usize,

    /// Number of projects whose items could not be fetched.
    pub fetch_failures: usize,

    /// Whether this was a testing run.
    pub testing: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(testing: bool) -> Self {
        Self {
            testing,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: &ProcessingResult) {
        self.items_processed += 1;
        match result {
            ProcessingResult::Synced { report, .. } => {
                self.tickets_updated += report.updated.len();
                self.links_attached += report.links_attached();
                self.comments_added += report.comments_added();
                self.transitions_applied += report.transitions_applied();
                self.tickets_created += report.tickets_created();
                self.comments_mirrored += report.comments_mirrored();
                self.fields_updated += report.fields_updated();
            }
            ProcessingResult::Skipped { .. } => self.items_skipped += 1,
            ProcessingResult::Failed { .. } => self.items_failed += 1,
        }
    }

    /// Records a project whose items could not be fetched.
    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    /// Returns true if any failures occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.items_failed > 0 || self.fetch_failures > 0
    }

    /// Returns true if all operations were successful.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures()
    }
}
