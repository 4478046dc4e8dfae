//! Newsletter digest - a batch job that turns a day of AI newsletters into one email.
//!
//! Each run fetches newsletters from a dedicated Gmail inbox, extracts their
//! readable content, asks an LLM for categorized summaries and mails a single
//! digest. A small JSON ledger of processed message IDs keeps later runs from
//! repeating items.
//!
//! # Architecture
//!
//! The pipeline is strictly sequential:
//! - `mail` lists and fetches candidate messages (Gmail REST API, OAuth refresh token)
//! - `extract` turns HTML or text bodies into clean text and content links
//! - `ai` batches the items and calls the Anthropic Messages API
//! - `digest` renders plain-text and HTML bodies
//! - `deliver` sends the digest (or previews it)
//! - `ledger` records delivered message IDs
//!
//! `pipeline::DigestPipeline` wires these together behind traits so each stage
//! can be replaced in tests.
//!
//! # Example
//!
//! ```no_run
//! use newsletter_digest::core::config::Settings;
//!
//! newsletter_digest::setup_logging();
//!
//! let settings = Settings::load(std::path::Path::new("config.yaml"))?;
//! let plan = settings.category_plan()?;
//! println!("categories: {:?}", plan.categories());
//! # Ok::<(), newsletter_digest::errors::DigestError>(())
//! ```

// Module declarations
pub mod ai;
pub mod core;
pub mod deliver;
pub mod digest;
pub mod errors;
pub mod extract;
pub mod ledger;
pub mod mail;
pub mod pipeline;

pub use errors::DigestError;

/// Configure structured JSON logging at `info` level.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is a
/// no-op.
///
/// # Example
///
/// ```
/// newsletter_digest::setup_logging();
/// ```
pub fn setup_logging() {
    setup_logging_with(false);
}

/// Like [`setup_logging`], defaulting to `debug` when `debug` is set.
pub fn setup_logging_with(debug: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
