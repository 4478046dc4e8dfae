//! LLM (Anthropic Messages API) client module
//!
//! Encapsulates the HTTP call used to summarize newsletter batches.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::errors::{DigestError, truncate_body};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f64 = 0.3;
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for generating digest summaries
pub struct LlmClient {
    http: Client,
    api_key: SecretString,
    model_name: String,
    api_base: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(http: Client, api_key: SecretString, model_name: String) -> Self {
        Self::with_api_base(http, api_key, model_name, ANTHROPIC_API_BASE.to_string())
    }

    #[must_use]
    pub fn with_api_base(
        http: Client,
        api_key: SecretString,
        model_name: String,
        api_base: String,
    ) -> Self {
        Self {
            http,
            api_key,
            model_name,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Sends a single-turn prompt and returns the concatenated text blocks.
    ///
    /// # Errors
    ///
    /// Returns `SummarizationError` if the request fails, the API answers with a
    /// non-success status, or the response carries no text.
    pub async fn complete(&self, prompt: &str) -> Result<String, DigestError> {
        #[cfg(feature = "debug-logs")]
        info!("Using summarization prompt:\n{}", prompt);

        info!(
            model = %self.model_name,
            estimated_input_tokens = estimate_tokens(prompt),
            "Requesting summaries"
        );

        let request_body = json!({
            "model": self.model_name,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "temperature": TEMPERATURE,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| DigestError::SummarizationError(format!("API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(DigestError::SummarizationError(format!(
                "API error (status {status}): {}",
                truncate_body(&error_text, MAX_ERROR_BODY_LENGTH)
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            DigestError::SummarizationError(format!("Failed to parse API response: {e}"))
        })?;

        if let Some(usage) = response_json.get("usage") {
            debug!(
                input_tokens = usage.get("input_tokens").and_then(|v| v.as_u64()),
                output_tokens = usage.get("output_tokens").and_then(|v| v.as_u64()),
                stop_reason = response_json.get("stop_reason").and_then(|v| v.as_str()),
                "Summarization usage"
            );
        }

        extract_text(&response_json)
            .ok_or_else(|| DigestError::SummarizationError("No text in response".to_string()))
    }
}

/// Joins the `text` content blocks of a Messages API response.
fn extract_text(response: &Value) -> Option<String> {
    let parts: Vec<&str> = response
        .get("content")?
        .as_array()?
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
