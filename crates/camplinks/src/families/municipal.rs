use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{DetailPage, DetailPageSet, RaceFamily, parse_statewide, wiki_anchors, wiki_page};
use crate::parser::tables::{RESULTS_HEADER, RESULTS_VCARD};
use crate::parser::{ParseError, stripped_text};
use crate::types::ElectionResult;

pub const RACE_CATEGORY: &str = "Mayor";

static RE_CITY_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^/wiki/(\d{4})_\w+_mayoral_(?:election|special_election)|^/wiki/(\d{4})_\w+_municipal_elections?",
    )
    .expect("invalid regex: city page")
});

static RE_WIKIPEDIA_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[-–]\s*Wikipedia$").expect("invalid regex: wikipedia suffix")
});

static SEL_CATEGORY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.mw-category").expect("invalid selector: mw-category"));

/// Category members that are not single-city election pages.
const SKIP_TITLES: [&str; 3] = [
    "united states local elections",
    "united states mayoral elections",
    "city of starbase",
];

const TITLE_SUFFIXES: [&str; 4] = [
    " mayoral election",
    " municipal election",
    " municipal elections",
    " mayoral special election",
];

pub const FAMILY: RaceFamily = RaceFamily {
    key: "municipal",
    race_category: RACE_CATEGORY,
    race_categories: &[RACE_CATEGORY],
    index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

pub fn index_locator(year: u16) -> String {
    wiki_page(&format!("Category:{}_United_States_mayoral_elections", year))
}

/// City name from an article title such as "2025 Boston mayoral election".
pub fn extract_city_name(title: &str, year: u16) -> String {
    let prefix = format!("{} ", year);
    let title = RE_WIKIPEDIA_SUFFIX.replace(title, "");
    let mut name = title.strip_prefix(&prefix).unwrap_or(&title).to_string();

    let suffix = TITLE_SUFFIXES.iter().find(|s| {
        name.len()
            .checked_sub(s.len())
            .and_then(|start| name.get(start..))
            .is_some_and(|tail| tail.eq_ignore_ascii_case(s))
    });
    if let Some(suffix) = suffix {
        name.truncate(name.len() - suffix.len());
    }

    name.trim().to_string()
}

fn is_skipped(title: &str) -> bool {
    let lower = title.to_lowercase();
    SKIP_TITLES.iter().any(|skip| lower.contains(skip))
}

/// City pages from the category listing: links with the usual mayoral or
/// municipal title pattern first, then any other link whose text mentions
/// a mayoral or municipal race.
pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<DetailPage> {
    let document = Html::parse_document(index_html);
    let scope = document
        .select(&SEL_CATEGORY)
        .next()
        .unwrap_or_else(|| document.root_element());
    let year_text = year.to_string();
    let mut pages = DetailPageSet::default();

    for (anchor, href) in wiki_anchors(scope) {
        let Some(caps) = RE_CITY_PAGE.captures(href) else {
            continue;
        };
        let matched_year = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        if matched_year != Some(year_text.as_str()) || pages.contains(href) {
            continue;
        }
        let title = stripped_text(anchor);
        if is_skipped(&title) {
            continue;
        }
        let city = extract_city_name(&title, year);
        if !city.is_empty() {
            pages.push(href, city);
        }
    }

    for (anchor, href) in wiki_anchors(scope) {
        if pages.contains(href) {
            continue;
        }
        let title = stripped_text(anchor);
        let lower = title.to_lowercase();
        if !(lower.contains("mayoral") || lower.contains("municipal")) || is_skipped(&title) {
            continue;
        }
        let city = extract_city_name(&title, year);
        if !city.is_empty() {
            pages.push(href, city);
        }
    }

    log::info!("Found {} municipal election pages for {}", pages.len(), year);
    pages.into_pages()
}

/// Mayoral result for one city; the jurisdiction is the city itself.
pub fn parse_detail_page(
    city: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    parse_statewide(city, html, year, RACE_CATEGORY, &[RESULTS_VCARD, RESULTS_HEADER], true)
}
