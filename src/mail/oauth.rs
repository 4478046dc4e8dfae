//! OAuth2 refresh-token exchange for the Gmail API.

use std::time::{Duration, Instant};

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::{DigestError, truncate_body};

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens are refreshed this long before Google says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: SecretString,
    expires_at: Instant,
}

/// Exchanges a long-lived refresh token for short-lived access tokens.
pub struct OAuthTokenProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthTokenProvider {
    #[must_use]
    pub fn new(
        http: Client,
        client_id: String,
        client_secret: SecretString,
        refresh_token: SecretString,
    ) -> Self {
        Self::with_token_url(
            http,
            GOOGLE_TOKEN_URL.to_string(),
            client_id,
            client_secret,
            refresh_token,
        )
    }

    #[must_use]
    pub fn with_token_url(
        http: Client,
        token_url: String,
        client_id: String,
        client_secret: SecretString,
        refresh_token: SecretString,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id,
            client_secret,
            refresh_token,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, refreshing it when missing or near expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the token endpoint is unreachable or rejects the
    /// refresh token.
    pub async fn access_token(&self) -> Result<SecretString, DigestError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(SecretString::from(token.value.expose_secret().to_string()));
        }

        let fresh = self.refresh().await?;
        let value = SecretString::from(fresh.value.expose_secret().to_string());
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drops the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> Result<CachedToken, DigestError> {
        debug!("Refreshing Gmail access token");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", self.refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| DigestError::AuthError(format!("Token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DigestError::AuthError(format!(
                "Token refresh failed ({status}): {}",
                truncate_body(&body, MAX_ERROR_BODY_LENGTH)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DigestError::AuthError(format!("Failed to parse refresh response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        info!(expires_in = lifetime.as_secs(), "Refreshed Gmail access token");

        Ok(CachedToken {
            value: SecretString::from(token.access_token),
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}
