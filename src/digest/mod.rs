//! Digest composition
//!
//! Renders a [`Digest`] as a subject line plus plain-text and HTML bodies.
//! Output depends only on the digest and the title; nothing here reads the
//! clock.

use std::fmt::Write;

use crate::core::models::{Digest, DigestSection, SummaryEntry};

const RULE_WIDTH: usize = 60;

/// A rendered digest ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDigest {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Heading icon for the well-known categories, a bullet otherwise.
#[must_use]
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Papers" => "📄",
        "News" => "📰",
        "Tools" => "🛠️",
        "Industry Updates" => "📊",
        _ => "•",
    }
}

#[derive(Debug, Clone)]
pub struct DigestComposer {
    title: String,
}

impl DigestComposer {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    #[must_use]
    pub fn compose(&self, digest: &Digest) -> ComposedDigest {
        ComposedDigest {
            subject: format!("{} — {}", self.title, date_label(digest)),
            text_body: self.render_text(digest),
            html_body: self.render_html(digest),
        }
    }

    #[must_use]
    pub fn render_text(&self, digest: &Digest) -> String {
        let rule = "═".repeat(RULE_WIDTH);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "   {} — {}",
            self.title.to_uppercase(),
            date_label(digest)
        );
        let _ = writeln!(out, "   Processed {} newsletters", digest.processed_count);
        let _ = writeln!(out, "{rule}");

        for section in digest.non_empty_sections() {
            let _ = writeln!(
                out,
                "\n{} {}",
                category_icon(&section.category),
                section.category.to_uppercase()
            );
            let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
            for (i, entry) in section.entries.iter().enumerate() {
                let _ = writeln!(out, "\n{}. {}", i + 1, entry.headline);
                if !entry.summary.is_empty() {
                    let _ = writeln!(out, "   {}", entry.summary);
                }
                let _ = writeln!(out, "   {}", source_line(entry));
            }
        }

        if digest.entry_count() == 0 {
            let _ = writeln!(out, "\nNo items made it into today's digest.");
        }

        let _ = write!(out, "\n{rule}\n");
        out
    }

    #[must_use]
    pub fn render_html(&self, digest: &Digest) -> String {
        let mut sections_html = String::new();
        for section in digest.non_empty_sections() {
            render_section_html(&mut sections_html, section);
        }
        if digest.entry_count() == 0 {
            sections_html.push_str(
                r#"<p style="color: #666;">No items made it into today's digest.</p>"#,
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto;">
    <div style="border-bottom: 3px solid #333; padding: 20px 0; margin-bottom: 30px;">
        <h1 style="margin: 0; color: #333;">{heading}</h1>
        <p style="color: #666; margin: 10px 0 0 0;">{date} • Processed {count} newsletters</p>
    </div>
{sections_html}</body>
</html>
"#,
            title = html_escape(&self.title),
            heading = html_escape(&self.title.to_uppercase()),
            date = date_label(digest),
            count = digest.processed_count,
        )
    }
}

fn render_section_html(out: &mut String, section: &DigestSection) {
    let _ = writeln!(
        out,
        r#"    <h2 style="color: #2c5282; margin-top: 30px;">{} {}</h2>"#,
        category_icon(&section.category),
        html_escape(&section.category.to_uppercase())
    );
    out.push_str("    <ol style=\"line-height: 1.8;\">\n");
    for entry in &section.entries {
        let link_html = entry
            .link
            .as_deref()
            .map(|link| {
                format!(
                    r#" | <a href="{}" style="color: #2c5282;">Link</a>"#,
                    html_escape(link)
                )
            })
            .unwrap_or_default();
        let _ = writeln!(
            out,
            r#"        <li style="margin-bottom: 20px;">
            <strong>{headline}</strong><br>
            <span style="color: #444;">{summary}</span><br>
            <span style="color: #666; font-size: 0.9em;">Source: {source}{link_html}</span>
        </li>"#,
            headline = html_escape(&entry.headline),
            summary = html_escape(&entry.summary),
            source = html_escape(&entry.source),
        );
    }
    out.push_str("    </ol>\n");
}

fn source_line(entry: &SummaryEntry) -> String {
    match &entry.link {
        Some(link) => format!("Source: {} | {link}", entry.source),
        None => format!("Source: {}", entry.source),
    }
}

fn date_label(digest: &Digest) -> String {
    digest.date.format("%B %d, %Y").to_string()
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_for_known_categories() {
        assert_eq!(category_icon("Papers"), "📄");
        assert_eq!(category_icon("Industry Updates"), "📊");
        assert_eq!(category_icon("Robotics"), "•");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<b>"R&D"</b>"#),
            "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt;"
        );
    }
}
