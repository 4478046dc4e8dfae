//! Mail source: mailbox access and newsletter selection

pub mod filters;
pub mod gmail;
pub mod oauth;
pub mod payload;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::core::models::Message;
use crate::errors::DigestError;
use crate::ledger::ProcessedLedger;

pub use filters::{SenderAllowList, SenderPattern};
pub use gmail::GmailClient;
pub use oauth::OAuthTokenProvider;

/// Time window and read-state filter for the mailbox search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailQuery {
    pub after: DateTime<Utc>,
    pub unread_only: bool,
}

impl MailQuery {
    #[must_use]
    pub fn lookback(now: DateTime<Utc>, hours: u32, unread_only: bool) -> Self {
        Self {
            after: now - Duration::hours(i64::from(hours)),
            unread_only,
        }
    }

    #[must_use]
    pub fn to_gmail_query(&self) -> String {
        let after = format!("after:{}", self.after.timestamp());
        if self.unread_only {
            format!("is:unread {after}")
        } else {
            after
        }
    }

    #[must_use]
    pub fn contains(&self, received_at: DateTime<Utc>) -> bool {
        received_at >= self.after
    }
}

#[async_trait]
pub trait MailSource: Send + Sync {
    /// IDs of every message matching the query, across all result pages.
    async fn list_message_ids(&self, query: &MailQuery) -> Result<Vec<String>, DigestError>;

    async fn fetch_message(&self, id: &str) -> Result<Message, DigestError>;

    /// Clears the unread flag on delivered messages.
    async fn mark_as_read(&self, ids: &[String]) -> Result<(), DigestError>;
}

/// Returns the allow-listed messages inside the window that the ledger has
/// not seen, oldest first.
///
/// Ledger hits are dropped before their bodies are downloaded.
///
/// # Errors
///
/// Propagates `AuthError` and `FetchError` from the source.
pub async fn fetch_newsletters(
    source: &dyn MailSource,
    query: &MailQuery,
    allow_list: &SenderAllowList,
    ledger: &ProcessedLedger,
) -> Result<Vec<Message>, DigestError> {
    let ids = source.list_message_ids(query).await?;
    let listed = ids.len();

    let mut seen = std::collections::HashSet::new();
    let fresh: Vec<String> = ids
        .into_iter()
        .filter(|id| !ledger.contains(id) && seen.insert(id.clone()))
        .collect();

    let mut messages = Vec::with_capacity(fresh.len());
    for id in &fresh {
        let message = source.fetch_message(id).await?;
        if !allow_list.allows(&message) {
            debug!(message_id = %id, sender = %message.sender, "Sender not allow-listed");
            continue;
        }
        if !query.contains(message.received_at) {
            debug!(message_id = %id, "Message outside lookback window");
            continue;
        }
        messages.push(message);
    }

    messages.sort_by(|a, b| {
        a.received_at
            .cmp(&b.received_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    info!(
        listed,
        already_processed = listed - fresh.len(),
        selected = messages.len(),
        "Selected newsletters"
    );
    Ok(messages)
}
