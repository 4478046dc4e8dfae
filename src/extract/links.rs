use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use super::html::{compile, selector};
use crate::core::models::Link;

/// Substrings (matched against URL and anchor text) that mark footer links.
const NON_CONTENT_KEYWORDS: &[&str] = &[
    "unsubscribe",
    "manage preferences",
    "update profile",
    "view in browser",
    "privacy policy",
    "terms of service",
    "contact us",
    "twitter.com",
    "facebook.com",
    "linkedin.com",
    "instagram.com",
];

pub(crate) static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static RAW_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"https?://[^\s<>"{}\\|^`\[\]]+"#));

/// Anchors in an HTML body, filtered to content links.
#[must_use]
pub fn extract_links_from_html(html: &str) -> Vec<Link> {
    document_links(&Html::parse_document(html))
}

/// Anchors in an already parsed document, filtered to content links.
#[must_use]
pub fn document_links(document: &Html) -> Vec<Link> {
    let raw = document.select(&ANCHOR_SELECTOR).filter_map(|anchor| {
        let url = anchor.value().attr("href")?.trim().to_string();
        let text = collapse_spaces(&anchor.text().collect::<Vec<_>>().join(" "));
        Some(Link { url, text })
    });
    normalize_and_dedupe_links(raw)
}

/// Bare URLs in a plain-text body. The URL doubles as the link text.
#[must_use]
pub fn extract_links_from_text(text: &str) -> Vec<Link> {
    let raw = RAW_URL_RE.find_iter(text).map(|m| {
        let url = trim_trailing_punctuation(m.as_str()).to_string();
        Link {
            text: url.clone(),
            url,
        }
    });
    normalize_and_dedupe_links(raw)
}

/// Unsubscribe, preference, legal and social links.
#[must_use]
pub fn is_footer_link(url: &str, text: &str) -> bool {
    let url_lower = url.to_lowercase();
    let text_lower = text.to_lowercase();
    NON_CONTENT_KEYWORDS
        .iter()
        .any(|k| url_lower.contains(k) || text_lower.contains(k))
}

#[must_use]
pub fn is_content_link(url: &str, text: &str) -> bool {
    if is_footer_link(url, text) {
        return false;
    }
    let url_lower = url.to_lowercase();
    url_lower.starts_with("http://") || url_lower.starts_with("https://")
}

/// Drops non-content links, normalizes the rest and keeps the first
/// occurrence of each URL.
#[must_use]
pub fn normalize_and_dedupe_links<I>(raw_links: I) -> Vec<Link>
where
    I: IntoIterator<Item = Link>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Link> = Vec::new();

    for link in raw_links {
        if !is_content_link(&link.url, &link.text) {
            continue;
        }
        if let Some(url) = normalize_link(trim_trailing_punctuation(link.url.trim()))
            && seen.insert(url.clone())
        {
            let text = if link.text.trim().is_empty() {
                url.clone()
            } else {
                link.text.trim().to_string()
            };
            out.push(Link { url, text });
        }
    }

    out
}

#[must_use]
fn normalize_link(raw: &str) -> Option<String> {
    let raw = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '<' | '>' | '"' | '\''));
    let mut url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);

    let rendered = url.to_string();
    Some(rendered.trim_end_matches('/').to_string())
}

#[must_use]
fn trim_trailing_punctuation(s: &str) -> &str {
    s.trim_end_matches(&['.', ',', ';', ':', '!', '?', ')', ']', '}'][..])
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
