use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use newsletter_digest::ai::{ItemLimits, LlmClient, LlmSummarizer};
use newsletter_digest::core::config::{AppConfig, Settings};
use newsletter_digest::deliver::{GmailMailer, Mailer, PreviewMailer};
use newsletter_digest::ledger::FileLedgerStore;
use newsletter_digest::mail::gmail::build_http_client;
use newsletter_digest::mail::{GmailClient, MailQuery, OAuthTokenProvider};
use newsletter_digest::pipeline::{DigestPipeline, RunOptions};

/// Fetch AI newsletters, summarize them and send one digest email.
#[derive(Debug, Parser)]
#[command(name = "newsletter-digest", version, about)]
struct Cli {
    /// YAML settings file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Lookback window in hours (overrides newsletters.lookback_hours)
    #[arg(long)]
    hours: Option<u32>,

    /// Ledger file (overrides ledger.path)
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Print the digest instead of sending it; the ledger is not updated
    #[arg(long, visible_alias = "preview")]
    dry_run: bool,

    /// Debug-level logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    newsletter_digest::setup_logging_with(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "Newsletter digest failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let AppConfig {
        gmail_client_id,
        gmail_client_secret,
        gmail_refresh_token,
        anthropic_api_key,
        newsletter_account,
        digest_recipient,
        anthropic_model,
    } = AppConfig::from_env().context("reading environment")?;

    let lookback_hours = cli.hours.unwrap_or(settings.newsletters.lookback_hours);
    anyhow::ensure!(lookback_hours > 0, "--hours must be at least 1");

    let now = Utc::now();
    let options = RunOptions {
        query: MailQuery::lookback(now, lookback_hours, settings.newsletters.unread_only),
        allow_list: settings.allow_list()?,
        plan: settings.category_plan()?,
        recipient: digest_recipient,
        digest_date: now.with_timezone(&settings.timezone()?).date_naive(),
        title: settings.digest.title.clone(),
        mark_as_read: settings.newsletters.mark_as_read,
        ledger_retention: Some(settings.ledger_retention(lookback_hours)),
        dry_run: cli.dry_run,
    };

    let http = build_http_client()?;
    let tokens = OAuthTokenProvider::new(
        http.clone(),
        gmail_client_id,
        gmail_client_secret,
        gmail_refresh_token,
    );
    let gmail = Arc::new(GmailClient::new(http.clone(), tokens));

    let model = anthropic_model.unwrap_or_else(|| settings.summarization.model.clone());
    let summarizer = LlmSummarizer::new(
        LlmClient::new(http, anthropic_api_key, model),
        ItemLimits {
            max_content_chars: settings.summarization.max_content_chars,
            max_links: settings.summarization.max_links_per_item,
        },
        settings.summarization.max_batch_chars,
    );

    let mailer: Box<dyn Mailer> = if cli.dry_run {
        Box::new(PreviewMailer)
    } else {
        Box::new(GmailMailer::new(Arc::clone(&gmail), newsletter_account))
    };

    let ledger_path = cli.ledger.unwrap_or_else(|| settings.ledger.path.clone());
    let ledger_store = FileLedgerStore::new(ledger_path);

    let pipeline = DigestPipeline::new(
        gmail.as_ref(),
        &summarizer,
        mailer.as_ref(),
        &ledger_store,
    );
    let report = pipeline.run(&options).await?;

    info!(
        run_id = %report.run_id,
        report = %serde_json::to_string(&report).unwrap_or_default(),
        "Run complete"
    );
    anyhow::ensure!(
        report.outcome.is_success(),
        "no content extracted from {} newsletters",
        report.skipped
    );
    Ok(())
}
