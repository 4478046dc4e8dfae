//! Gmail API message resources and their conversion into [`Message`].

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::core::models::{Message, MessageBody};
use crate::errors::DigestError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    /// Milliseconds since the epoch, as a decimal string.
    #[serde(default)]
    pub internal_date: Option<String>,
    pub payload: MessagePart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

impl MessagePart {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Depth-first search for the first non-empty part of `mime_type`.
    #[must_use]
    pub fn find_body(&self, mime_type: &str) -> Option<String> {
        if self.mime_type.eq_ignore_ascii_case(mime_type)
            && let Some(decoded) = self.body.data.as_deref().and_then(decode_body)
            && !decoded.trim().is_empty()
        {
            return Some(decoded);
        }
        self.parts.iter().find_map(|part| part.find_body(mime_type))
    }
}

/// Gmail encodes bodies as base64url, with or without padding.
#[must_use]
pub fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_internal_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let millis = raw?.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

impl GmailMessage {
    /// # Errors
    ///
    /// Returns `FetchError` if the message carries no usable receive time.
    pub fn into_message(self) -> Result<Message, DigestError> {
        let payload = &self.payload;
        let received_at = parse_internal_date(self.internal_date.as_deref())
            .or_else(|| {
                payload
                    .header("Date")
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|d| d.with_timezone(&Utc))
            })
            .ok_or_else(|| {
                DigestError::FetchError(format!("message {} has no receive date", self.id))
            })?;

        let html = payload.find_body("text/html");
        let text = payload.find_body("text/plain");
        if html.is_none() && text.is_none() {
            warn!(message_id = %self.id, "Message has neither HTML nor text body");
        }

        Ok(Message {
            sender: payload.header("From").unwrap_or_default().to_string(),
            subject: payload.header("Subject").unwrap_or_default().to_string(),
            received_at,
            body: MessageBody { html, text },
            id: self.id,
        })
    }
}
