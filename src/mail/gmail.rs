//! Gmail REST API client
//!
//! Covers the four calls the digest needs: list, get, batchModify and send.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::oauth::OAuthTokenProvider;
use super::payload::{GmailMessage, ListMessagesResponse};
use super::{MailQuery, MailSource};
use crate::core::models::Message;
use crate::errors::{DigestError, truncate_body};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

const PAGE_SIZE: u32 = 100;
const MAX_ERROR_BODY_LENGTH: usize = 300;

/// Builds the shared HTTP client used for Gmail and the token endpoint.
///
/// # Errors
///
/// Returns `ConfigError` if the TLS backend cannot be initialised.
pub fn build_http_client() -> Result<Client, DigestError> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| DigestError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

/// Which error kind a failed call maps to.
#[derive(Clone, Copy)]
enum Call {
    Read,
    Send,
}

impl Call {
    fn error(self, msg: String) -> DigestError {
        match self {
            Call::Read => DigestError::FetchError(msg),
            Call::Send => DigestError::DeliveryError(msg),
        }
    }
}

pub struct GmailClient {
    http: Client,
    api_base: String,
    tokens: OAuthTokenProvider,
}

impl GmailClient {
    #[must_use]
    pub fn new(http: Client, tokens: OAuthTokenProvider) -> Self {
        Self::with_api_base(http, tokens, GMAIL_API_BASE.to_string())
    }

    #[must_use]
    pub fn with_api_base(http: Client, tokens: OAuthTokenProvider, api_base: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, DigestError> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        call: Call,
        what: &str,
    ) -> Result<Response, DigestError> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| call.error(format!("{what}: request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let detail = format!(
            "{what}: status={status} body={}",
            truncate_body(&body, MAX_ERROR_BODY_LENGTH)
        );
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.tokens.invalidate().await;
            return Err(DigestError::AuthError(detail));
        }
        Err(call.error(detail))
    }

    /// Sends an RFC 822 message that is already base64url encoded.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` on transport failure or a non-success status,
    /// `AuthError` when the token is rejected.
    pub async fn send_raw(&self, raw: &str) -> Result<String, DigestError> {
        let url = format!("{}/messages/send", self.api_base);
        let response = self
            .execute(
                self.http.post(&url).json(&json!({ "raw": raw })),
                Call::Send,
                "messages.send",
            )
            .await?;

        let sent: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DigestError::DeliveryError(format!("messages.send: bad response: {e}")))?;
        Ok(sent
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_message_ids(&self, query: &MailQuery) -> Result<Vec<String>, DigestError> {
        let url = format!("{}/messages", self.api_base);
        let q = query.to_gmail_query();
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> =
                vec![("q", q.clone()), ("maxResults", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: ListMessagesResponse = self
                .execute(self.http.get(&url).query(&params), Call::Read, "messages.list")
                .await?
                .json()
                .await
                .map_err(|e| DigestError::FetchError(format!("messages.list: bad response: {e}")))?;

            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(query = %q, count = ids.len(), "Listed candidate messages");
        Ok(ids)
    }

    async fn fetch_message(&self, id: &str) -> Result<Message, DigestError> {
        let url = format!("{}/messages/{id}", self.api_base);
        let message: GmailMessage = self
            .execute(
                self.http.get(&url).query(&[("format", "full")]),
                Call::Read,
                "messages.get",
            )
            .await?
            .json()
            .await
            .map_err(|e| {
                DigestError::FetchError(format!("messages.get {id}: bad response: {e}"))
            })?;

        debug!(message_id = %id, "Fetched message");
        message.into_message()
    }

    async fn mark_as_read(&self, ids: &[String]) -> Result<(), DigestError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = format!("{}/messages/batchModify", self.api_base);
        self.execute(
            self.http
                .post(&url)
                .json(&json!({ "ids": ids, "removeLabelIds": ["UNREAD"] })),
            Call::Read,
            "messages.batchModify",
        )
        .await?;
        info!(count = ids.len(), "Marked messages as read");
        Ok(())
    }
}
