use std::fmt::Write as _;

use crate::core::models::{CategoryPlan, ExtractedItem};

/// Per-item limits applied when a newsletter is written into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLimits {
    pub max_content_chars: usize,
    pub max_links: usize,
}

/// Removes control characters other than newlines and tabs.
#[must_use]
pub fn sanitize_for_prompt(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

/// Renders one newsletter block. `index` is 1-based within the batch.
#[must_use]
pub fn format_item(index: usize, item: &ExtractedItem, limits: ItemLimits) -> String {
    let content: String = item.text.chars().take(limits.max_content_chars).collect();

    let mut out = String::new();
    let _ = writeln!(out, "=== Newsletter {index} ===");
    let _ = writeln!(out, "Source: {}", sanitize_for_prompt(&item.source));
    let _ = writeln!(out, "Title: {}", sanitize_for_prompt(&item.title));
    let _ = writeln!(out, "\nContent:\n{}", sanitize_for_prompt(&content));

    let links: Vec<_> = item.links.iter().take(limits.max_links).collect();
    if !links.is_empty() {
        out.push_str("\nLinks:\n");
        for link in links {
            let _ = writeln!(out, "- {}: {}", sanitize_for_prompt(&link.text), link.url);
        }
    }
    out.push('\n');
    out
}

#[must_use]
pub fn format_newsletters(items: &[ExtractedItem], limits: ItemLimits) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format_item(i + 1, item, limits))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Characters the prompt template adds around the newsletter blocks.
#[must_use]
pub fn prompt_overhead(plan: &CategoryPlan) -> usize {
    build_prompt("", plan).chars().count()
}

/// Full user prompt for one batch.
#[must_use]
pub fn build_prompt(newsletters_text: &str, plan: &CategoryPlan) -> String {
    let categories = plan.categories().join(", ");
    let max_items = plan.max_items_per_category();

    format!(
        r#"You are an AI newsletter digest curator. Your task is to read multiple AI newsletters and create a consolidated daily digest.

CATEGORIES: {categories}

INSTRUCTIONS:
1. Read through all the newsletters below
2. Extract the most important and interesting items
3. Categorize each item into exactly one of the categories above; use no other category names
4. Summarize each item in 1-2 concise sentences
5. Include up to {max_items} items per category
6. Prioritize:
   - Novel research and breakthrough papers
   - Significant product launches and tools
   - Important industry news and updates
7. For each item, include:
   - Brief summary (1-2 sentences)
   - Source newsletter name
   - Relevant link (if available, copied from the newsletter's links)

OUTPUT FORMAT (JSON):
{{
  "Category Name": [
    {{
      "title": "Item headline",
      "summary": "1-2 sentence summary",
      "source": "Newsletter name",
      "link": "URL (if available)"
    }}
  ]
}}

NEWSLETTERS:
{newsletters_text}

Please provide the digest in valid JSON format only, no additional text."#
    )
}
