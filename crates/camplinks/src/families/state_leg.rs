use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use super::{DetailPage, RaceFamily, collect_detail_pages, tables_to_results, title_words, wiki_page};
use crate::parser::tables::{DISTRICT_HEADING_VCARD, GENERAL, run_strategies};
use crate::parser::{
    ParseError, ensure_not_empty, extract_district, find_preceding_heading, page_title,
    stripped_text,
};
use crate::types::{Election, ElectionResult};

pub const STATE_HOUSE: &str = "State House";
pub const STATE_SENATE: &str = "State Senate";

static RE_CHAMBER_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^/wiki/(\d{4})_(\w+?)_(?:House_of_Delegates|General_Assembly|House_of_Representatives|State_Senate|State_Assembly|Assembly)_election",
    )
    .expect("invalid regex: chamber page")
});

static RE_TITLE_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})\s+(.+?)\s+(?:House|General|State|Assembly|Senate)")
        .expect("invalid regex: title state")
});

pub const FAMILY: RaceFamily = RaceFamily {
    key: "state_leg",
    race_category: STATE_HOUSE,
    race_categories: &[STATE_HOUSE, STATE_SENATE],
    index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

pub fn index_locator(year: u16) -> String {
    wiki_page(&format!("{}_United_States_state_legislative_elections", year))
}

/// Upper chambers are named "Senate"; every other chamber counts as the
/// lower house.
pub fn classify_chamber(text: &str) -> &'static str {
    if text.to_lowercase().contains("senate") {
        STATE_SENATE
    } else {
        STATE_HOUSE
    }
}

/// Regular chamber elections; special elections belong to
/// `state_leg_special`.
pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<DetailPage> {
    let year = year.to_string();
    collect_detail_pages(index_html, |href| {
        if href.to_lowercase().contains("special") {
            return None;
        }
        let caps = RE_CHAMBER_PAGE.captures(href)?;
        (caps[1] == year).then(|| title_words(&caps[2]))
    })
}

fn state_from_title(title: &str, year: u16) -> Option<String> {
    let caps = RE_TITLE_STATE.captures(title)?;
    (caps[1] == year.to_string()).then(|| caps[2].trim().to_string())
}

fn heading_text(table: ElementRef, tags: &[&str]) -> Option<String> {
    find_preceding_heading(table, tags).map(stripped_text)
}

/// Per-district results. The chamber and state come from the page title.
pub fn parse_detail_page(
    label: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    ensure_not_empty(html, label)?;
    let document = Html::parse_document(html);

    let title = page_title(&document);
    let race_category = classify_chamber(&title);
    let state = state_from_title(&title, year).unwrap_or_else(|| label.to_string());

    let tables = run_strategies(&document, &[GENERAL, DISTRICT_HEADING_VCARD]);
    Ok(tables_to_results(&tables, |t| {
        let text = if t.strategy == GENERAL.name {
            heading_text(t.table, &["h2"]).or_else(|| heading_text(t.table, &["h3"]))
        } else {
            heading_text(t.table, &["h2", "h3"])
        };
        let district = extract_district(&text.unwrap_or_default());
        Election::new(state.as_str(), race_category, year, Some(district))
    }))
}
