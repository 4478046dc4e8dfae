use crate::core::models::Message;
use crate::errors::DigestError;

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderPattern {
    /// `news@example.com` matches only that address.
    Address(String),
    /// `@example.com` or `example.com` matches the domain and its subdomains.
    Domain(String),
}

impl SenderPattern {
    /// # Errors
    ///
    /// Returns `ConfigError` for blank patterns or patterns with an empty domain.
    pub fn parse(raw: &str) -> Result<Self, DigestError> {
        let pattern = raw.trim().to_ascii_lowercase();
        if pattern.is_empty() {
            return Err(DigestError::ConfigError(
                "allowed_senders entries must not be blank".to_string(),
            ));
        }

        match pattern.rsplit_once('@') {
            Some(("", domain)) => Self::domain(domain, raw),
            Some((_, domain)) if !domain.is_empty() => Ok(SenderPattern::Address(pattern)),
            Some(_) => Err(DigestError::ConfigError(format!(
                "allowed sender '{raw}' has no domain"
            ))),
            None => Self::domain(&pattern, raw),
        }
    }

    fn domain(domain: &str, raw: &str) -> Result<Self, DigestError> {
        let domain = domain.trim_start_matches('.');
        if domain.is_empty() {
            return Err(DigestError::ConfigError(format!(
                "allowed sender '{raw}' has no domain"
            )));
        }
        Ok(SenderPattern::Domain(domain.to_string()))
    }

    #[must_use]
    pub fn matches(&self, address: &str) -> bool {
        let address = address.trim().to_ascii_lowercase();
        match self {
            SenderPattern::Address(expected) => address == *expected,
            SenderPattern::Domain(domain) => {
                let Some((_, sender_domain)) = address.rsplit_once('@') else {
                    return false;
                };
                sender_domain == domain || sender_domain.ends_with(&format!(".{domain}"))
            }
        }
    }
}

/// Senders whose mail is eligible for the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderAllowList {
    patterns: Vec<SenderPattern>,
}

impl SenderAllowList {
    /// # Errors
    ///
    /// Returns `ConfigError` if the list is empty or any pattern is malformed.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, DigestError> {
        if patterns.is_empty() {
            return Err(DigestError::ConfigError(
                "newsletters.allowed_senders must not be empty".to_string(),
            ));
        }
        let patterns = patterns
            .iter()
            .map(|p| SenderPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn allows_address(&self, address: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(address))
    }

    #[must_use]
    pub fn allows(&self, message: &Message) -> bool {
        self.allows_address(&message.sender_address())
    }
}
