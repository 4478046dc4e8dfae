#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use newsletter_digest::ai::Summarizer;
use newsletter_digest::core::models::{
    CategoryPlan, DigestSection, ExtractedItem, Message, MessageBody, SummaryEntry,
};
use newsletter_digest::deliver::{Mailer, OutgoingEmail};
use newsletter_digest::errors::DigestError;
use newsletter_digest::ledger::{LedgerSnapshot, LedgerStore};
use newsletter_digest::mail::{MailQuery, MailSource, SenderAllowList};
use newsletter_digest::pipeline::RunOptions;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 2, 7, 0, 0).unwrap()
}

pub fn plan() -> CategoryPlan {
    CategoryPlan::new(
        vec![
            "Papers".into(),
            "News".into(),
            "Tools".into(),
            "Industry Updates".into(),
        ],
        3,
    )
    .unwrap()
}

pub fn options() -> RunOptions {
    RunOptions {
        query: MailQuery::lookback(now(), 24, true),
        allow_list: SenderAllowList::new(&["@aiweekly.co", "news@import.ai", "substack.com"])
            .unwrap(),
        plan: plan(),
        recipient: "reader@example.com".into(),
        digest_date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        title: "AI Daily Digest".into(),
        mark_as_read: true,
        ledger_retention: None,
        dry_run: false,
    }
}

/// An HTML newsletter from an allow-listed sender, received an hour ago.
pub fn newsletter(id: &str) -> Message {
    Message {
        id: id.into(),
        sender: "\"AI Weekly\" <hello@aiweekly.co>".into(),
        subject: format!("Issue {id}"),
        received_at: now() - Duration::hours(1),
        body: MessageBody {
            html: Some(format!(
                "<html><head><title>AI Weekly {id}</title></head><body>\
                 <p>A new open-weights model tops the reasoning leaderboard this week.</p>\
                 <a href=\"https://example.com/{id}\">Read more</a>\
                 <p><a href=\"https://aiweekly.co/unsubscribe\">Unsubscribe</a></p>\
                 </body></html>"
            )),
            text: None,
        },
    }
}

pub fn newsletter_from(id: &str, sender: &str) -> Message {
    Message {
        sender: sender.into(),
        ..newsletter(id)
    }
}

pub fn empty_newsletter(id: &str) -> Message {
    Message {
        body: MessageBody {
            html: Some("<html><body><img src=\"https://t.co/p.gif\" width=\"1\" height=\"1\"></body></html>".into()),
            text: Some("  ".into()),
        },
        ..newsletter(id)
    }
}

pub fn entry(category: &str, headline: &str) -> SummaryEntry {
    SummaryEntry {
        category: category.into(),
        headline: headline.into(),
        summary: format!("Summary of {headline}."),
        source: "AI Weekly".into(),
        link: Some(format!("https://example.com/{headline}")),
    }
}

pub fn section(category: &str, headlines: &[&str]) -> DigestSection {
    DigestSection {
        category: category.into(),
        entries: headlines.iter().map(|h| entry(category, h)).collect(),
    }
}

#[derive(Default)]
pub struct FakeMailSource {
    pub messages: Vec<Message>,
    pub fail_fetch: bool,
    pub fail_mark_as_read: bool,
    pub fetched: Mutex<Vec<String>>,
    pub marked_read: Mutex<Vec<String>>,
}

impl FakeMailSource {
    pub fn with(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn marked_read(&self) -> Vec<String> {
        self.marked_read.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSource for FakeMailSource {
    async fn list_message_ids(&self, _query: &MailQuery) -> Result<Vec<String>, DigestError> {
        Ok(self.messages.iter().map(|m| m.id.clone()).collect())
    }

    async fn fetch_message(&self, id: &str) -> Result<Message, DigestError> {
        if self.fail_fetch {
            return Err(DigestError::FetchError(format!("connection reset fetching {id}")));
        }
        self.fetched.lock().unwrap().push(id.to_string());
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| DigestError::FetchError(format!("no message {id}")))
    }

    async fn mark_as_read(&self, ids: &[String]) -> Result<(), DigestError> {
        if self.fail_mark_as_read {
            return Err(DigestError::FetchError("batchModify failed".into()));
        }
        self.marked_read.lock().unwrap().extend(ids.iter().cloned());
        Ok(())
    }
}

pub struct FakeSummarizer {
    response: Result<Vec<DigestSection>, String>,
    pub received: Mutex<Vec<ExtractedItem>>,
}

impl FakeSummarizer {
    pub fn returning(sections: Vec<DigestSection>) -> Self {
        Self {
            response: Ok(sections),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received_ids(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.message_id.clone())
            .collect()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(
        &self,
        items: &[ExtractedItem],
        _plan: &CategoryPlan,
    ) -> Result<Vec<DigestSection>, DigestError> {
        self.received.lock().unwrap().extend(items.iter().cloned());
        self.response
            .clone()
            .map_err(DigestError::SummarizationError)
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DigestError> {
        if self.fail {
            return Err(DigestError::DeliveryError("SMTP relay refused".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    pub blob: Mutex<Option<LedgerSnapshot>>,
    pub fail_writes: bool,
    pub writes: Mutex<usize>,
}

impl MemoryLedgerStore {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            blob: Mutex::new(Some(LedgerSnapshot {
                processed_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..LedgerSnapshot::default()
            })),
            ..Self::default()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.blob
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.processed_ids.clone())
            .unwrap_or_default()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn read(&self) -> Result<Option<LedgerSnapshot>, DigestError> {
        Ok(self.blob.lock().unwrap().clone())
    }

    fn write(&self, snapshot: &LedgerSnapshot) -> Result<(), DigestError> {
        if self.fail_writes {
            return Err(DigestError::LedgerError("read-only filesystem".into()));
        }
        *self.blob.lock().unwrap() = Some(snapshot.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}
