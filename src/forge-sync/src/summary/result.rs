//! Processing result types.

use crate::reconcile::{SyncError, SyncOutcome, SyncReport};

/// Result of processing a single upstream item.
#[derive(Debug, Clone)]
pub enum ProcessingResult {
    /// At least one ticket was reconciled.
    Synced {
        /// Item URL.
        item: String,
        /// What was changed.
        report: SyncReport,
    },

    /// Nothing was reconciled.
    Skipped {
        /// Item URL.
        item: String,
        /// Reason for skipping.
        reason: String,
    },

    /// Processing failed.
    Failed {
        /// Item URL.
        item: String,
        /// Error message.
        error: String,
    },
}

impl ProcessingResult {
    /// Classifies the outcome of reconciling `item`.
    #[must_use]
    pub fn from_sync(item: &str, result: Result<SyncReport, SyncError>) -> Self {
        let item = item.to_string();
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                return Self::Failed {
                    item,
                    error: e.to_string(),
                }
            }
        };

        let reason = match report.outcome {
            SyncOutcome::Synced => return Self::Synced { item, report },
            SyncOutcome::DryRun => "testing mode".to_string(),
            SyncOutcome::NoCandidates => "no ticket keys referenced".to_string(),
            SyncOutcome::Unresolved => format!(
                "{} candidate key(s), none resolved to a single ticket",
                report.abandoned.len()
            ),
        };
        Self::Skipped { item, reason }
    }

    /// Returns the item this result is about.
    #[must_use]
    pub fn item(&self) -> &str {
        match self {
            Self::Synced { item, .. } | Self::Skipped { item, .. } | Self::Failed { item, .. } => {
                item
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{AbandonReason, AbandonedCandidate};
    use crate::tracker::TrackerError;

    const URL: &str = "https://github.com/org/repo/pull/7";

    fn report(outcome: SyncOutcome) -> SyncReport {
        SyncReport {
            outcome,
            updated: Vec::new(),
            abandoned: Vec::new(),
        }
    }

    #[test]
    fn synced_report_is_synced() {
        let result = ProcessingResult::from_sync(URL, Ok(report(SyncOutcome::Synced)));
        assert!(matches!(result, ProcessingResult::Synced { .. }));
        assert_eq!(result.item(), URL);
    }

    #[test]
    fn unresolved_report_is_skipped() {
        let mut unresolved = report(SyncOutcome::Unresolved);
        unresolved.abandoned.push(AbandonedCandidate {
            key: "FACTORY-1".to_string(),
            reason: AbandonReason::NotFound,
        });

        match ProcessingResult::from_sync(URL, Ok(unresolved)) {
            ProcessingResult::Skipped { reason, .. } => {
                assert!(reason.starts_with("1 candidate"));
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn error_is_failed() {
        let error = SyncError::Tracker(TrackerError::Api {
            status: 500,
            body: "boom".to_string(),
        });

        match ProcessingResult::from_sync(URL, Err(error)) {
            ProcessingResult::Failed { error, .. } => assert!(error.contains("500")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
