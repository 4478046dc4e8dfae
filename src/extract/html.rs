//! HTML parsing, sanitizing and HTML-to-text conversion

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use super::is_boilerplate;
use super::links::{ANCHOR_SELECTOR, is_footer_link};

/// Compiles a built-in pattern; an invalid one degrades to a never-matching regex.
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Invalid built-in selector")
}

static HIDDEN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| selector("head, script, style, noscript, template"));
static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("title"));

/// Elements that count as the "enclosing block" of a footer link.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "td", "th", "li", "tr", "footer", "center", "section", "table",
];

/// Blocks longer than this are never dropped wholesale, only their footer links.
const FOOTER_BLOCK_MAX_CHARS: usize = 200;

const HIDDEN_STYLES: &[&str] = &[
    "display:none",
    "visibility:hidden",
    "width:0px",
    "width:1px",
    "height:0px",
    "height:1px",
];

#[must_use]
pub fn parse(raw: &str) -> Html {
    Html::parse_document(raw)
}

/// The document `<title>`, if it has a non-blank one.
#[must_use]
pub fn title(document: &Html) -> Option<String> {
    let title = document
        .select(&TITLE_SELECTOR)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// Removes everything that never carries readable content: head, script,
/// style and noscript elements, comments, tracking pixels, and footer links
/// together with any short block that holds nothing else.
pub fn sanitize(document: &mut Html) {
    let mut doomed: Vec<_> = document
        .select(&HIDDEN_SELECTOR)
        .map(|el| el.id())
        .collect();
    doomed.extend(
        document
            .select(&IMG_SELECTOR)
            .filter(is_tracking_pixel)
            .map(|el| el.id()),
    );
    doomed.extend(
        document
            .tree
            .nodes()
            .filter(|node| node.value().is_comment())
            .map(|node| node.id()),
    );
    doomed.extend(footer_elements(document).into_iter().map(|el| el.id()));

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn is_tracking_pixel(img: &ElementRef<'_>) -> bool {
    let el = img.value();
    let tiny = |attr: &str| {
        el.attr(attr)
            .is_some_and(|v| matches!(v.trim().trim_end_matches("px"), "0" | "1"))
    };
    let style = el
        .attr("style")
        .unwrap_or_default()
        .to_ascii_lowercase()
        .replace(char::is_whitespace, "");

    tiny("width")
        || tiny("height")
        || el.attr("hidden").is_some()
        || HIDDEN_STYLES.iter().any(|s| style.contains(s))
}

/// Footer anchors, widened to their nearest block when the block's own text
/// is empty or itself a footer notice.
fn footer_elements(document: &Html) -> Vec<ElementRef<'_>> {
    let anchors: Vec<ElementRef<'_>> = document
        .select(&ANCHOR_SELECTOR)
        .filter(|a| {
            let href = a.value().attr("href").unwrap_or_default();
            is_footer_link(href, &a.text().collect::<Vec<_>>().join(" "))
        })
        .collect();
    let anchor_ids: HashSet<_> = anchors.iter().map(|a| a.id()).collect();

    let text_outside_anchors = |block: ElementRef<'_>| -> String {
        (*block)
            .descendants()
            .filter_map(|node| {
                let text: &str = node.value().as_text()?;
                let in_anchor = node.ancestors().any(|a| anchor_ids.contains(&a.id()));
                (!in_anchor).then_some(text)
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    anchors
        .iter()
        .map(|&anchor| {
            let block = (*anchor)
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| BLOCK_TAGS.contains(&el.value().name()));
            match block {
                Some(block) if is_short(block) => {
                    let rest = text_outside_anchors(block);
                    if !rest.chars().any(char::is_alphanumeric) || is_boilerplate(&rest) {
                        block
                    } else {
                        anchor
                    }
                }
                _ => anchor,
            }
        })
        .collect()
}

fn is_short(block: ElementRef<'_>) -> bool {
    block
        .text()
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .count()
        <= FOOTER_BLOCK_MAX_CHARS
}

/// Renders a (sanitized) document as wrapped plain text.
///
/// Returns `None` if the document cannot be rendered.
#[must_use]
pub fn to_text(document: &Html, width: usize) -> Option<String> {
    let html = document.root_element().html();
    html2text::from_read(html.as_bytes(), width).ok()
}
