use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Mailbox authentication failed: {0}")]
    AuthError(String),

    #[error("Failed to fetch messages: {0}")]
    FetchError(String),

    #[error("Message {message_id} has no usable content")]
    EmptyContent { message_id: String },

    #[error("Failed to summarize newsletters: {0}")]
    SummarizationError(String),

    #[error("Failed to deliver digest: {0}")]
    DeliveryError(String),

    #[error("Failed to access processed-ID ledger: {0}")]
    LedgerError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl DigestError {
    /// Whether this error aborts the run. Only `EmptyContent` is per-message.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DigestError::EmptyContent { .. })
    }

    /// Pipeline stage the error belongs to, used as a structured log field.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            DigestError::AuthError(_) | DigestError::FetchError(_) => "fetch",
            DigestError::EmptyContent { .. } => "extract",
            DigestError::SummarizationError(_) => "summarize",
            DigestError::DeliveryError(_) => "deliver",
            DigestError::LedgerError(_) => "ledger",
            DigestError::ConfigError(_) => "config",
        }
    }
}

impl From<serde_yaml::Error> for DigestError {
    fn from(error: serde_yaml::Error) -> Self {
        DigestError::ConfigError(format!("settings parse: {error}"))
    }
}

impl From<lettre::error::Error> for DigestError {
    fn from(error: lettre::error::Error) -> Self {
        DigestError::DeliveryError(format!("MIME build failed: {error}"))
    }
}

impl From<lettre::address::AddressError> for DigestError {
    fn from(error: lettre::address::AddressError) -> Self {
        DigestError::DeliveryError(format!("Invalid email address: {error}"))
    }
}

/// Truncates an HTTP error body before it is embedded in an error or log line.
#[must_use]
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        let head: String = body.chars().take(max_chars).collect();
        format!("{head}... (truncated)")
    } else {
        body.to_string()
    }
}
