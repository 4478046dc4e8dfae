use chrono::{Duration, NaiveDate};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::{RunOutcome, RunReport};
use crate::ai::Summarizer;
use crate::core::models::{CategoryPlan, Digest, ExtractedItem, Message};
use crate::deliver::{Mailer, OutgoingEmail};
use crate::digest::DigestComposer;
use crate::errors::DigestError;
use crate::extract::ContentExtractor;
use crate::ledger::{LedgerStore, ProcessedLedger};
use crate::mail::{MailQuery, MailSource, SenderAllowList, fetch_newsletters};

/// Per-run inputs that come from configuration and the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub query: MailQuery,
    pub allow_list: SenderAllowList,
    pub plan: CategoryPlan,
    pub recipient: String,
    pub digest_date: NaiveDate,
    pub title: String,
    pub mark_as_read: bool,
    /// Ledger IDs older than this are pruned on commit.
    pub ledger_retention: Option<Duration>,
    /// Skip the ledger commit and the mark-as-read step.
    pub dry_run: bool,
}

/// One fetch, extract, summarize, compose, deliver pass.
pub struct DigestPipeline<'a> {
    source: &'a dyn MailSource,
    summarizer: &'a dyn Summarizer,
    mailer: &'a dyn Mailer,
    ledger_store: &'a dyn LedgerStore,
    extractor: ContentExtractor,
}

impl<'a> DigestPipeline<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn MailSource,
        summarizer: &'a dyn Summarizer,
        mailer: &'a dyn Mailer,
        ledger_store: &'a dyn LedgerStore,
    ) -> Self {
        Self {
            source,
            summarizer,
            mailer,
            ledger_store,
            extractor: ContentExtractor::new(),
        }
    }

    /// Runs every stage in order. Any fatal error stops the run before the
    /// digest is sent or the ledger is written.
    ///
    /// # Errors
    ///
    /// Returns the first fatal `DigestError`; `EmptyContent` is never returned.
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport, DigestError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("digest_run", run_id = %run_id);

        self.run_stages(run_id.clone(), options)
            .instrument(span)
            .await
            .inspect_err(|e| {
                error!(run_id = %run_id, stage = e.stage(), error = %e, "Digest run failed");
            })
    }

    async fn run_stages(
        &self,
        run_id: String,
        options: &RunOptions,
    ) -> Result<RunReport, DigestError> {
        let mut report = RunReport::new(run_id);
        info!(dry_run = options.dry_run, "Starting digest run");

        let mut ledger = ProcessedLedger::load(self.ledger_store)?;
        if let Some(retention) = options.ledger_retention {
            ledger = ledger.with_retention(retention);
        }

        let messages =
            fetch_newsletters(self.source, &options.query, &options.allow_list, &ledger).await?;
        report.fetched = messages.len();
        if messages.is_empty() {
            info!(stage = "fetch", "No new newsletters");
            return Ok(report.finish(RunOutcome::NoNewMessages));
        }

        let items = self.extract_all(&messages, &mut report)?;
        if items.is_empty() {
            error!(
                stage = "extract",
                skipped = report.skipped,
                "No content extracted from any newsletter"
            );
            return Ok(report.finish(RunOutcome::NothingToSummarize));
        }

        let sections = self.summarizer.summarize(&items, &options.plan).await?;
        let digest = Digest::assemble(options.digest_date, &options.plan, sections, messages.len());
        report.digest_entries = digest.entry_count();
        info!(stage = "summarize", entries = report.digest_entries, "Digest assembled");

        let composed = DigestComposer::new(options.title.as_str()).compose(&digest);
        let email = OutgoingEmail::from_digest(options.recipient.as_str(), composed);
        self.mailer.send(&email).await?;

        if options.dry_run {
            info!(stage = "ledger", "Dry run, ledger left unchanged");
            return Ok(report.finish(RunOutcome::Previewed));
        }

        let ids: Vec<String> = messages.iter().map(|m| m.id.clone()).collect();
        report.ledger_ids_added = ledger.commit(self.ledger_store, ids.iter().cloned())?;

        if options.mark_as_read
            && let Err(e) = self.source.mark_as_read(&ids).await
        {
            warn!(stage = "fetch", error = %e, "Failed to mark newsletters as read");
        }

        Ok(report.finish(RunOutcome::Delivered))
    }

    fn extract_all(
        &self,
        messages: &[Message],
        report: &mut RunReport,
    ) -> Result<Vec<ExtractedItem>, DigestError> {
        let mut items = Vec::with_capacity(messages.len());
        for message in messages {
            match self.extractor.extract(message) {
                Ok(item) => items.push(item),
                Err(e) if !e.is_fatal() => {
                    warn!(
                        stage = e.stage(),
                        message_id = %message.id,
                        error = %e,
                        "Skipping message"
                    );
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        report.extracted = items.len();
        Ok(items)
    }
}
