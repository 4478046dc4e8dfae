//! Sequential composition of the digest stages

pub mod runner;

use serde::Serialize;
use tracing::info;

pub use runner::{DigestPipeline, RunOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The mailbox had nothing new.
    NoNewMessages,
    /// Every fetched message was empty after extraction. Nothing sent.
    NothingToSummarize,
    Delivered,
    /// Rendered in dry-run mode; ledger untouched.
    Previewed,
}

impl RunOutcome {
    /// Whether the job should exit with success. A run whose newsletters all
    /// came out empty fails so the scheduler surfaces it.
    #[must_use]
    pub fn is_success(self) -> bool {
        !matches!(self, Self::NothingToSummarize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub fetched: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub digest_entries: usize,
    pub ledger_ids_added: usize,
}

impl RunReport {
    fn new(run_id: String) -> Self {
        Self {
            run_id,
            outcome: RunOutcome::NoNewMessages,
            fetched: 0,
            extracted: 0,
            skipped: 0,
            digest_entries: 0,
            ledger_ids_added: 0,
        }
    }

    fn finish(mut self, outcome: RunOutcome) -> Self {
        self.outcome = outcome;
        info!(
            outcome = ?self.outcome,
            fetched = self.fetched,
            extracted = self.extracted,
            skipped = self.skipped,
            digest_entries = self.digest_entries,
            ledger_ids_added = self.ledger_ids_added,
            "Digest run finished"
        );
        self
    }
}
