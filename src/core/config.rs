use std::env;
use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use secrecy::SecretString;
use serde::Deserialize;

use super::models::CategoryPlan;
use crate::errors::DigestError;
use crate::mail::SenderAllowList;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Credentials and addresses, read from the environment.
#[derive(Debug)]
pub struct AppConfig {
    pub gmail_client_id: String,
    pub gmail_client_secret: SecretString,
    pub gmail_refresh_token: SecretString,
    pub anthropic_api_key: SecretString,
    pub newsletter_account: String,
    pub digest_recipient: String,
    pub anthropic_model: Option<String>,
}

fn required(name: &str) -> Result<String, DigestError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(DigestError::ConfigError(format!("{name}: empty value"))),
        Err(e) => Err(DigestError::ConfigError(format!("{name}: {e}"))),
    }
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first missing or empty variable.
    pub fn from_env() -> Result<Self, DigestError> {
        Ok(Self {
            gmail_client_id: required("GMAIL_CLIENT_ID")?,
            gmail_client_secret: SecretString::from(required("GMAIL_CLIENT_SECRET")?),
            gmail_refresh_token: SecretString::from(required("GMAIL_REFRESH_TOKEN")?),
            anthropic_api_key: SecretString::from(required("ANTHROPIC_API_KEY")?),
            newsletter_account: required("GMAIL_NEWSLETTER_ACCOUNT")?,
            digest_recipient: required("GMAIL_DIGEST_RECIPIENT")?,
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty()),
        })
    }
}

/// Non-secret settings loaded from the YAML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub schedule: ScheduleSettings,
    pub newsletters: NewsletterSettings,
    pub summarization: SummarizationSettings,
    #[serde(default)]
    pub digest: DigestSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    /// IANA zone used to date the digest. Trigger times live in the scheduler.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterSettings {
    pub allowed_senders: Vec<String>,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    #[serde(default = "default_true")]
    pub unread_only: bool,
    #[serde(default = "default_true")]
    pub mark_as_read: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizationSettings {
    #[serde(default = "default_model")]
    pub model: String,
    pub categories: Vec<String>,
    #[serde(default = "default_max_items")]
    pub max_items_per_category: usize,
    #[serde(default = "default_max_batch_chars")]
    pub max_batch_chars: usize,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_max_links")]
    pub max_links_per_item: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigestSettings {
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
    /// IDs older than this are pruned. Never shorter than the lookback window.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_lookback_hours() -> u32 {
    24
}
fn default_true() -> bool {
    true
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_max_items() -> usize {
    5
}
fn default_max_batch_chars() -> usize {
    60_000
}
fn default_max_content_chars() -> usize {
    2_000
}
fn default_max_links() -> usize {
    10
}
fn default_title() -> String {
    "AI Daily Digest".to_string()
}
fn default_ledger_path() -> PathBuf {
    PathBuf::from("processed_ids.json")
}
fn default_retention_days() -> u32 {
    30
}

impl Settings {
    /// Reads and validates a YAML settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, malformed or fails validation.
    pub fn load(path: &Path) -> Result<Self, DigestError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DigestError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self, DigestError> {
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DigestError> {
        if self.newsletters.lookback_hours == 0 {
            return Err(DigestError::ConfigError(
                "newsletters.lookback_hours must be at least 1".to_string(),
            ));
        }
        if self.summarization.max_batch_chars == 0 || self.summarization.max_content_chars == 0 {
            return Err(DigestError::ConfigError(
                "summarization size limits must be positive".to_string(),
            ));
        }
        if u64::from(self.ledger.retention_days) * 24 < u64::from(self.newsletters.lookback_hours) {
            return Err(DigestError::ConfigError(
                "ledger.retention_days must cover newsletters.lookback_hours".to_string(),
            ));
        }
        self.allow_list()?;
        self.category_plan()?;
        self.timezone()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the allow-list is empty or has a malformed pattern.
    pub fn allow_list(&self) -> Result<SenderAllowList, DigestError> {
        SenderAllowList::new(&self.newsletters.allowed_senders)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the category settings are invalid.
    pub fn category_plan(&self) -> Result<CategoryPlan, DigestError> {
        CategoryPlan::new(
            self.summarization.categories.clone(),
            self.summarization.max_items_per_category,
        )
    }

    /// How long ledger IDs are kept, stretched to `lookback_hours` when that
    /// is longer.
    #[must_use]
    pub fn ledger_retention(&self, lookback_hours: u32) -> Duration {
        let retention = Duration::days(i64::from(self.ledger.retention_days));
        retention.max(Duration::hours(i64::from(lookback_hours)))
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the zone is not a known IANA name.
    pub fn timezone(&self) -> Result<Tz, DigestError> {
        self.schedule.timezone.parse::<Tz>().map_err(|e| {
            DigestError::ConfigError(format!(
                "schedule.timezone '{}': {e}",
                self.schedule.timezone
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
newsletters:
  allowed_senders: ["@substack.com"]
summarization:
  categories: ["Papers", "News"]
"#;

    #[test]
    fn defaults_are_applied() {
        let settings = Settings::from_yaml(MINIMAL).unwrap();
        assert_eq!(settings.newsletters.lookback_hours, 24);
        assert!(settings.newsletters.unread_only);
        assert!(settings.newsletters.mark_as_read);
        assert_eq!(settings.summarization.max_items_per_category, 5);
        assert_eq!(settings.summarization.model, DEFAULT_MODEL);
        assert_eq!(settings.digest.title, "AI Daily Digest");
        assert_eq!(settings.ledger.path, PathBuf::from("processed_ids.json"));
        assert_eq!(settings.ledger.retention_days, 30);
        assert_eq!(settings.timezone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn retention_never_undercuts_lookback() {
        let settings = Settings::from_yaml(MINIMAL).unwrap();
        assert_eq!(settings.ledger_retention(24), Duration::days(30));
        assert_eq!(settings.ledger_retention(24 * 45), Duration::days(45));

        let yaml = format!("ledger:\n  retention_days: 1\n{MINIMAL}").replace(
            "allowed_senders",
            "lookback_hours: 48\n  allowed_senders",
        );
        let err = Settings::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, DigestError::ConfigError(ref m) if m.contains("retention_days")));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let yaml = format!("schedule:\n  timezone: Mars/Olympus\n{MINIMAL}");
        let err = Settings::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, DigestError::ConfigError(ref m) if m.contains("Mars/Olympus")));
    }

    #[test]
    fn empty_allow_list_is_rejected() {
        let yaml = r#"
newsletters:
  allowed_senders: []
summarization:
  categories: ["Papers"]
"#;
        assert!(Settings::from_yaml(yaml).is_err());
    }
}
