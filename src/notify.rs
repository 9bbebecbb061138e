//! The `notify` task: a completion line once the tweets are stored.

use crate::constants::COMPLETION_MESSAGE;
use crate::models::RunReport;

pub trait Notifier: Send + Sync {
    fn notify(&self, report: &RunReport);
}

/// Writes the completion message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &RunReport) {
        tracing::info!(
            fetched = report.fetched,
            inserted = report.inserted,
            "{}",
            COMPLETION_MESSAGE
        );
    }
}
