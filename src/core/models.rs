use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DigestError;

/// Body parts of a fetched message. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub html: Option<String>,
    pub text: Option<String>,
}

/// A newsletter email as returned by the mail source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Raw `From` header, e.g. `"AI Weekly" <hello@aiweekly.co>`.
    pub sender: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
    pub body: MessageBody,
}

impl Message {
    /// The bare address from the `From` header, lowercased.
    #[must_use]
    pub fn sender_address(&self) -> String {
        parse_sender(&self.sender).1
    }

    /// Display name of the sender, falling back to the address.
    #[must_use]
    pub fn sender_name(&self) -> String {
        let (name, address) = parse_sender(&self.sender);
        name.unwrap_or(address)
    }
}

/// Splits `Name <addr>` into its display name and lowercased address.
fn parse_sender(raw: &str) -> (Option<String>, String) {
    let raw = raw.trim();
    match (raw.find('<'), raw.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let address = raw[open + 1..close].trim().to_ascii_lowercase();
            let name = raw[..open]
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .trim()
                .to_string();
            let name = if name.is_empty() { None } else { Some(name) };
            (name, address)
        }
        _ => (None, raw.to_ascii_lowercase()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// Readable content pulled out of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub message_id: String,
    pub title: String,
    /// Newsletter name, taken from the sender display name.
    pub source: String,
    pub text: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub category: String,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub link: Option<String>,
}

/// The configured category enumeration and the per-category item cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPlan {
    categories: Vec<String>,
    max_items_per_category: usize,
}

impl CategoryPlan {
    /// # Errors
    ///
    /// Returns `ConfigError` when the list is empty, contains blank or
    /// duplicate (case-insensitive) names, or the cap is zero.
    pub fn new(categories: Vec<String>, max_items_per_category: usize) -> Result<Self, DigestError> {
        if categories.is_empty() {
            return Err(DigestError::ConfigError(
                "at least one category is required".to_string(),
            ));
        }
        if max_items_per_category == 0 {
            return Err(DigestError::ConfigError(
                "max_items_per_category must be at least 1".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for category in &categories {
            if category.trim().is_empty() {
                return Err(DigestError::ConfigError(
                    "category names must not be blank".to_string(),
                ));
            }
            if !seen.insert(category.trim().to_lowercase()) {
                return Err(DigestError::ConfigError(format!(
                    "duplicate category: {category}"
                )));
            }
        }
        Ok(Self {
            categories: categories.into_iter().map(|c| c.trim().to_string()).collect(),
            max_items_per_category,
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn max_items_per_category(&self) -> usize {
        self.max_items_per_category
    }

    /// Maps a category name from the summarizer onto its configured spelling.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSection {
    pub category: String,
    pub entries: Vec<SummaryEntry>,
}

/// One run's worth of categorized summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub date: NaiveDate,
    pub sections: Vec<DigestSection>,
    pub processed_count: usize,
}

impl Digest {
    /// Lays `sections` out in the plan's category order, dropping anything
    /// outside the plan and truncating each category to the cap.
    #[must_use]
    pub fn assemble(
        date: NaiveDate,
        plan: &CategoryPlan,
        sections: Vec<DigestSection>,
        processed_count: usize,
    ) -> Self {
        let mut ordered: Vec<DigestSection> = plan
            .categories()
            .iter()
            .map(|category| DigestSection {
                category: category.clone(),
                entries: Vec::new(),
            })
            .collect();

        for section in sections {
            let Some(name) = plan.resolve(&section.category) else {
                continue;
            };
            if let Some(slot) = ordered.iter_mut().find(|s| s.category == name) {
                slot.entries.extend(section.entries);
            }
        }

        for section in &mut ordered {
            section.entries.truncate(plan.max_items_per_category());
        }

        Self {
            date,
            sections: ordered,
            processed_count,
        }
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn non_empty_sections(&self) -> impl Iterator<Item = &DigestSection> {
        self.sections.iter().filter(|s| !s.entries.is_empty())
    }
}
