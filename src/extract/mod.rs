//! Content extraction: raw message body to readable text and content links

pub mod html;
pub mod links;

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::core::models::{ExtractedItem, Link, Message};
use crate::errors::DigestError;

/// Bodies with fewer non-whitespace characters than this count as empty.
pub const MIN_MEANINGFUL_CHARS: usize = 20;

const DEFAULT_WRAP_WIDTH: usize = 120;

/// Sentences that only ever appear in newsletter chrome.
const NOTICE_PHRASES: &[&str] = &[
    "you are receiving this",
    "you're receiving this",
    "you received this email",
    "add us to your address book",
];

/// Link labels of newsletter chrome. A line is chrome only when little else
/// is left on it once these are removed.
const NAV_PHRASES: &[&str] = &[
    "view this email in your browser",
    "view in browser",
    "view online",
    "manage your preferences",
    "manage preferences",
    "email preferences",
    "update your preferences",
    "update profile",
    "unsubscribe",
    "privacy policy",
    "terms of service",
    "forward to a friend",
];

/// Boilerplate detection only applies to lines up to this length.
const BOILERPLATE_MAX_LINE_CHARS: usize = 200;

/// Words a navigation line may carry besides its link labels ("click here").
const NAV_LINE_MAX_OTHER_WORDS: usize = 3;

static FOOTNOTE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| html::compile(r"^\s*\[\d+\]:\s"));
static FOOTNOTE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| html::compile(r"\[([^\[\]]*)\]\[\d+\]"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| html::compile(r"https?://\S+"));

#[derive(Debug, Clone)]
pub struct ContentExtractor {
    wrap_width: usize,
    min_meaningful_chars: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            min_meaningful_chars: MIN_MEANINGFUL_CHARS,
        }
    }
}

impl ContentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a message into readable text, title, source and links.
    ///
    /// HTML is preferred; the plain-text body is used when HTML is missing or
    /// renders to almost nothing.
    ///
    /// # Errors
    ///
    /// Returns `EmptyContent` when neither body has meaningful text.
    pub fn extract(&self, message: &Message) -> Result<ExtractedItem, DigestError> {
        let (html_title, from_html) = match message.body.html.as_deref() {
            Some(raw) => self.from_html(raw),
            None => (None, None),
        };

        let (text, links) = match from_html {
            Some(found) => found,
            None => {
                if message.body.html.is_some() {
                    debug!(message_id = %message.id, "HTML body near-empty, trying text body");
                }
                let text = message
                    .body
                    .text
                    .as_deref()
                    .map(clean_text)
                    .filter(|text| self.is_meaningful(text))
                    .ok_or_else(|| DigestError::EmptyContent {
                        message_id: message.id.clone(),
                    })?;
                let links = links::extract_links_from_text(&text);
                (text, links)
            }
        };

        let title = html_title
            .or_else(|| {
                let subject = message.subject.trim();
                (!subject.is_empty()).then(|| subject.to_string())
            })
            .unwrap_or_else(|| "Untitled".to_string());

        Ok(ExtractedItem {
            message_id: message.id.clone(),
            title,
            source: message.sender_name(),
            text,
            links,
        })
    }

    /// The document title, plus text and links when the body has meaningful text.
    fn from_html(&self, raw: &str) -> (Option<String>, Option<(String, Vec<Link>)>) {
        let mut document = html::parse(raw);
        let title = html::title(&document);
        html::sanitize(&mut document);

        let content = html::to_text(&document, self.wrap_width)
            .map(|text| clean_text(&text))
            .filter(|text| self.is_meaningful(text))
            .map(|text| (text, links::document_links(&document)));
        (title, content)
    }

    fn is_meaningful(&self, text: &str) -> bool {
        text.chars().filter(|c| !c.is_whitespace()).count() >= self.min_meaningful_chars
    }
}

/// Drops footnote and boilerplate lines, collapses blank-line runs to one
/// blank line and space runs to one space.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut last_blank = true;

    for line in text.lines() {
        if FOOTNOTE_LINE_RE.is_match(line) || is_boilerplate(line) {
            continue;
        }
        let line = FOOTNOTE_REF_RE.replace_all(line, "$1");
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !last_blank {
                out.push(String::new());
            }
            last_blank = true;
        } else {
            out.push(line);
            last_blank = false;
        }
    }

    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out.join("\n")
}

/// Short lines that are a footer notice, or nothing but chrome link labels
/// and URLs. Sentences that merely mention "unsubscribe" are content.
pub(crate) fn is_boilerplate(line: &str) -> bool {
    if line.chars().count() > BOILERPLATE_MAX_LINE_CHARS {
        return false;
    }
    let lower = line.to_lowercase();
    if NOTICE_PHRASES.iter().any(|p| lower.contains(p)) {
        return true;
    }
    if !NAV_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }

    let mut rest = URL_RE.replace_all(&lower, " ").into_owned();
    for phrase in NAV_PHRASES {
        rest = rest.replace(phrase, " ");
    }
    rest.split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .count()
        <= NAV_LINE_MAX_OTHER_WORDS
}
