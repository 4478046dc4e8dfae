//! Delivery of the composed digest

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use lettre::Message as MimeMessage;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use tracing::info;

use crate::digest::ComposedDigest;
use crate::errors::DigestError;
use crate::mail::GmailClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl OutgoingEmail {
    #[must_use]
    pub fn from_digest(to: impl Into<String>, digest: ComposedDigest) -> Self {
        Self {
            to: to.into(),
            subject: digest.subject,
            text_body: digest.text_body,
            html_body: digest.html_body,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends exactly one email. An `Ok` means the transport accepted it.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DigestError>;
}

/// Builds the `multipart/alternative` message (plain text first, then HTML).
///
/// # Errors
///
/// Returns `DeliveryError` for an unparseable address or a message that
/// cannot be built.
pub fn build_mime(from: &str, email: &OutgoingEmail) -> Result<MimeMessage, DigestError> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = email.to.parse()?;

    let message = MimeMessage::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body.clone()),
                ),
        )?;
    Ok(message)
}

/// Sends through the Gmail API as the newsletter account.
pub struct GmailMailer {
    client: Arc<GmailClient>,
    from: String,
}

impl GmailMailer {
    #[must_use]
    pub fn new(client: Arc<GmailClient>, from: impl Into<String>) -> Self {
        Self {
            client,
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DigestError> {
        let mime = build_mime(&self.from, email)?;
        let raw = URL_SAFE.encode(mime.formatted());
        let id = self.client.send_raw(&raw).await?;
        info!(to = %email.to, gmail_id = %id, subject = %email.subject, "Digest email sent");
        Ok(())
    }
}

/// Prints the digest to stdout instead of sending it.
#[derive(Debug, Default)]
pub struct PreviewMailer;

impl PreviewMailer {
    #[must_use]
    pub fn render(email: &OutgoingEmail) -> String {
        let rule = "=".repeat(70);
        format!(
            "{rule}\nEMAIL PREVIEW\n{rule}\nTo: {}\nSubject: {}\n{rule}\n{}\n{rule}\n",
            email.to, email.subject, email.text_body
        )
    }
}

#[async_trait]
impl Mailer for PreviewMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DigestError> {
        println!("{}", Self::render(email));
        info!(to = %email.to, subject = %email.subject, "Digest previewed, not sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "reader@example.com".into(),
            subject: "AI Daily Digest — January 02, 2026".into(),
            text_body: "plain body".into(),
            html_body: "<p>html body</p>".into(),
        }
    }

    #[test]
    fn mime_is_multipart_alternative() {
        let mime = build_mime("digest@example.com", &email()).unwrap();
        let raw = String::from_utf8(mime.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("To: reader@example.com"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn bad_recipient_is_a_delivery_error() {
        let mut email = email();
        email.to = "not an address".into();
        let err = build_mime("digest@example.com", &email).unwrap_err();
        assert!(matches!(err, DigestError::DeliveryError(_)));
    }

    #[test]
    fn preview_shows_subject_and_body() {
        let rendered = PreviewMailer::render(&email());
        assert!(rendered.contains("Subject: AI Daily Digest"));
        assert!(rendered.contains("plain body"));
    }
}
