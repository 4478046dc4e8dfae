//! Parsing and validation of the summarizer's JSON answer

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::core::models::{CategoryPlan, DigestSection, SummaryEntry};
use crate::errors::{DigestError, truncate_body};

const MAX_LOGGED_RESPONSE_CHARS: usize = 500;

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Slices out the JSON object between the first `{` and the last `}`.
fn json_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parses one summarizer answer into sections in plan order.
///
/// Categories outside the plan are dropped with a warning, as are entries
/// without a headline. Sections are not capped here.
///
/// # Errors
///
/// Returns `SummarizationError` when no JSON object can be parsed.
pub fn parse_response(text: &str, plan: &CategoryPlan) -> Result<Vec<DigestSection>, DigestError> {
    let object: Map<String, Value> = json_object_slice(text)
        .and_then(|slice| serde_json::from_str(slice).ok())
        .ok_or_else(|| {
            DigestError::SummarizationError(format!(
                "response is not a JSON object: {}",
                truncate_body(text, MAX_LOGGED_RESPONSE_CHARS)
            ))
        })?;

    let mut sections = empty_sections(plan);

    for (name, value) in object {
        let Some(category) = plan.resolve(&name) else {
            warn!(category = %name, "Dropping unrecognized category");
            continue;
        };
        let Value::Array(raw_entries) = value else {
            warn!(category = %name, "Category value is not a list");
            continue;
        };

        let Some(section) = sections.iter_mut().find(|s| s.category == category) else {
            continue;
        };
        for raw in raw_entries {
            let Ok(entry) = serde_json::from_value::<RawEntry>(raw) else {
                warn!(category = %category, "Skipping malformed entry");
                continue;
            };
            if let Some(entry) = into_summary_entry(category, entry) {
                section.entries.push(entry);
            } else {
                warn!(category = %category, "Skipping entry without a title");
            }
        }
    }

    Ok(sections)
}

fn into_summary_entry(category: &str, raw: RawEntry) -> Option<SummaryEntry> {
    let non_blank = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    Some(SummaryEntry {
        category: category.to_string(),
        headline: non_blank(raw.title)?,
        summary: non_blank(raw.summary).unwrap_or_default(),
        source: non_blank(raw.source).unwrap_or_else(|| "Unknown".to_string()),
        link: non_blank(raw.link),
    })
}

fn empty_sections(plan: &CategoryPlan) -> Vec<DigestSection> {
    plan.categories()
        .iter()
        .map(|c| DigestSection {
            category: c.clone(),
            entries: Vec::new(),
        })
        .collect()
}

/// Merges per-batch results category by category in batch order, then
/// truncates each category to the plan's cap.
#[must_use]
pub fn merge_sections(batches: Vec<Vec<DigestSection>>, plan: &CategoryPlan) -> Vec<DigestSection> {
    let mut merged = empty_sections(plan);
    for batch in batches {
        for section in batch {
            if let Some(slot) = merged.iter_mut().find(|s| s.category == section.category) {
                slot.entries.extend(section.entries);
            }
        }
    }
    for section in &mut merged {
        section.entries.truncate(plan.max_items_per_category());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> CategoryPlan {
        CategoryPlan::new(vec!["Papers".into(), "News".into()], 2).unwrap()
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let text = r#"Here is the digest:
```json
{"news": [{"title": "GPT-9 ships", "summary": "It shipped.", "source": "AI Weekly", "link": ""}]}
```"#;
        let sections = parse_response(text, &plan()).unwrap();
        assert_eq!(sections[0].category, "Papers");
        assert!(sections[0].entries.is_empty());
        let entry = &sections[1].entries[0];
        assert_eq!(entry.category, "News");
        assert_eq!(entry.headline, "GPT-9 ships");
        assert_eq!(entry.link, None);
    }

    #[test]
    fn unknown_categories_and_untitled_entries_are_dropped() {
        let text = r#"{
            "Memes": [{"title": "lol"}],
            "Papers": [{"summary": "no title"}, {"title": "Attention 2", "link": "https://arxiv.org/abs/1"}]
        }"#;
        let sections = parse_response(text, &plan()).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].entries.len(), 1);
        assert_eq!(sections[0].entries[0].source, "Unknown");
        assert_eq!(sections[0].entries[0].link.as_deref(), Some("https://arxiv.org/abs/1"));
    }

    #[test]
    fn non_json_is_an_error() {
        let err = parse_response("I could not read these newsletters.", &plan()).unwrap_err();
        assert!(matches!(err, DigestError::SummarizationError(_)));
        assert!(parse_response("{not json}", &plan()).is_err());
    }

    #[test]
    fn merge_keeps_batch_order_and_caps() {
        let plan = plan();
        let first = parse_response(r#"{"News": [{"title": "a"}, {"title": "b"}]}"#, &plan).unwrap();
        let second = parse_response(r#"{"News": [{"title": "c"}]}"#, &plan).unwrap();
        let merged = merge_sections(vec![first, second], &plan);
        let headlines: Vec<_> = merged[1].entries.iter().map(|e| e.headline.as_str()).collect();
        assert_eq!(headlines, vec!["a", "b"]);
    }
}
