use chrono::NaiveDate;

use newsletter_digest::core::models::{CategoryPlan, Digest, DigestSection, SummaryEntry};
use newsletter_digest::digest::DigestComposer;

fn entry(category: &str, headline: &str, link: Option<&str>) -> SummaryEntry {
    SummaryEntry {
        category: category.into(),
        headline: headline.into(),
        summary: format!("Why {headline} matters."),
        source: "Import AI".into(),
        link: link.map(str::to_string),
    }
}

fn digest() -> Digest {
    let plan = CategoryPlan::new(
        vec!["Papers".into(), "News".into(), "Tools".into(), "Robotics".into()],
        5,
    )
    .unwrap();
    Digest::assemble(
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
        &plan,
        vec![
            DigestSection {
                category: "Robotics".into(),
                entries: vec![entry("Robotics", "Humanoid <demo>", None)],
            },
            DigestSection {
                category: "Papers".into(),
                entries: vec![
                    entry("Papers", "Sparse attention", Some("https://arxiv.org/abs/1?a=1&b=2")),
                    entry("Papers", "Scaling laws", None),
                ],
            },
        ],
        4,
    )
}

#[test]
fn subject_has_title_and_long_date() {
    let composed = DigestComposer::new("AI Daily Digest").compose(&digest());
    assert_eq!(composed.subject, "AI Daily Digest — March 07, 2026");
}

#[test]
fn text_body_follows_category_order_and_numbers_entries() {
    let text = DigestComposer::new("AI Daily Digest").render_text(&digest());

    assert!(text.contains("AI DAILY DIGEST — March 07, 2026"));
    assert!(text.contains("Processed 4 newsletters"));
    let papers = text.find("📄 PAPERS").unwrap();
    let robotics = text.find("• ROBOTICS").unwrap();
    assert!(papers < robotics);
    assert!(!text.contains("NEWS"));
    assert!(!text.contains("TOOLS"));
    assert!(text.contains("1. Sparse attention"));
    assert!(text.contains("2. Scaling laws"));
    assert!(text.contains("Source: Import AI | https://arxiv.org/abs/1?a=1&b=2"));
    assert!(text.contains("Source: Import AI\n"));
}

#[test]
fn html_body_escapes_content() {
    let html = DigestComposer::new("AI Daily Digest").render_html(&digest());

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<html>"));
    assert!(html.contains("Humanoid &lt;demo&gt;"));
    assert!(!html.contains("Humanoid <demo>"));
    assert!(html.contains(r#"href="https://arxiv.org/abs/1?a=1&amp;b=2""#));
    assert!(html.contains("📄 PAPERS"));
    assert!(!html.contains("NEWS"));
}

#[test]
fn composition_is_deterministic() {
    let composer = DigestComposer::new("AI Daily Digest");
    assert_eq!(composer.compose(&digest()), composer.compose(&digest()));
}

#[test]
fn empty_digest_says_so() {
    let plan = CategoryPlan::new(vec!["News".into()], 3).unwrap();
    let empty = Digest::assemble(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(), &plan, Vec::new(), 2);
    let text = DigestComposer::new("AI Daily Digest").render_text(&empty);
    assert!(text.contains("No items made it into today's digest."));
}
