pub mod bio;
pub mod classify;
pub mod district;
pub mod normalize;
pub mod profile;
pub mod rows;
pub mod tables;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

pub use classify::is_general_election;
pub use district::extract_district;
pub use normalize::normalize;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty document: {0}")]
    EmptyDocument(String),
    #[error("Failed to parse URL: {0}")]
    UrlParse(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

pub(crate) static RE_INCUMBENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(incumbent\)").expect("invalid regex: incumbent"));

pub(crate) static SEL_CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("invalid selector: caption"));

pub(crate) static SEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector: a"));

pub(crate) static SEL_BOLD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("b").expect("invalid selector: b"));

static SEL_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("invalid selector: title"));

pub(crate) fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element text with every text node trimmed and joined without separators.
pub(crate) fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect::<String>()
}

pub(crate) fn has_class(element: ElementRef, class: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

pub(crate) fn is_bold(element: ElementRef) -> bool {
    element.select(&SEL_BOLD).next().is_some()
}

/// Direct `td`/`th` children of a table row.
pub(crate) fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect()
}

pub(crate) fn caption_text(table: ElementRef) -> Option<String> {
    table
        .select(&SEL_CAPTION)
        .next()
        .map(|c| stripped_text(c).to_lowercase())
}

pub(crate) fn page_title(document: &Html) -> String {
    document
        .select(&SEL_TITLE)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .unwrap_or_default()
}

/// Resolve a `/wiki/...` href against the Wikipedia origin. Any other href
/// yields an empty string.
pub(crate) fn wiki_url(href: &str) -> String {
    if href.starts_with("/wiki/") {
        format!("{}{}", crate::BASE_URL, href)
    } else {
        String::new()
    }
}

pub(crate) fn strip_incumbent(name: &str) -> String {
    RE_INCUMBENT.replace_all(name, "").trim().to_string()
}

/// Walk backward through `element`'s preceding siblings to the nearest
/// heading named in `tags`. Headings wrapped in a `div.mw-heading` container
/// are found too.
pub fn find_preceding_heading<'a>(
    element: ElementRef<'a>,
    tags: &[&str],
) -> Option<ElementRef<'a>> {
    for sibling in element.prev_siblings() {
        let Some(prev) = ElementRef::wrap(sibling) else {
            continue;
        };
        let name = prev.value().name();
        if tags.contains(&name) {
            return Some(prev);
        }
        if name == "div" && has_class(prev, "mw-heading") {
            let inner = prev
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|e| tags.contains(&e.value().name()));
            if inner.is_some() {
                return inner;
            }
        }
    }
    None
}

pub(crate) fn ensure_not_empty(html: &str, url: &str) -> Result<(), ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyDocument(url.to_string()));
    }
    Ok(())
}
