use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::state_leg::{self, STATE_HOUSE, STATE_SENATE, classify_chamber};
use super::{DetailPage, RaceFamily, collect_detail_pages, tables_to_results, title_words};
use crate::parser::tables::{ANY_VCARD, GENERAL, run_strategies};
use crate::parser::{ParseError, ensure_not_empty, extract_district, page_title};
use crate::types::{AT_LARGE, Election, ElectionResult};

static RE_SPECIAL_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/(\d{4})_\w+.*special_election").expect("invalid regex: special page")
});

/// Specials for offices other than a state legislature.
const OTHER_OFFICES: [&str; 5] = [
    "congressional_district",
    "gubernatorial",
    "attorney_general",
    "supreme_court",
    "mayoral",
];

const CHAMBER_WORDS: [&str; 5] = ["house", "senate", "assembly", "delegates", "representatives"];

/// Chamber names in the order they are tried when splitting the state off
/// a page name.
const CHAMBER_BOUNDARIES: [&str; 7] = [
    "House_of_Representatives",
    "House_of_Delegates",
    "General_Assembly",
    "State_Senate",
    "Senate",
    "Assembly",
    "House",
];

pub const FAMILY: RaceFamily = RaceFamily {
    key: "state_leg_special",
    race_category: STATE_HOUSE,
    race_categories: &[STATE_HOUSE, STATE_SENATE],
    index_locator: state_leg::index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

fn state_from_href(href: &str, year: u16) -> String {
    let prefix = format!("/wiki/{}_", year);
    let page = href.strip_prefix(&prefix).unwrap_or(href);
    for chamber in CHAMBER_BOUNDARIES {
        if let Some((state, _)) = page.split_once(&format!("_{}", chamber)) {
            return title_words(state);
        }
    }
    title_words(page.split('_').next().unwrap_or(page))
}

pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<DetailPage> {
    let year_text = year.to_string();
    let pages = collect_detail_pages(index_html, |href| {
        let caps = RE_SPECIAL_PAGE.captures(href)?;
        if caps[1] != year_text {
            return None;
        }
        let lower = href.to_lowercase();
        if OTHER_OFFICES.iter().any(|o| lower.contains(o)) {
            return None;
        }
        if !CHAMBER_WORDS.iter().any(|w| lower.contains(w)) {
            return None;
        }
        Some(state_from_href(href, year))
    });
    log::info!("Found {} state legislative special election pages", pages.len());
    pages
}

/// Chamber and district both come from the page title.
pub fn parse_detail_page(
    state: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    ensure_not_empty(html, state)?;
    let document = Html::parse_document(html);

    let title = page_title(&document);
    let race_category = classify_chamber(&title);
    let district = if title.is_empty() {
        AT_LARGE.to_string()
    } else {
        extract_district(&title)
    };

    let tables = run_strategies(&document, &[GENERAL, ANY_VCARD]);
    Ok(tables_to_results(&tables, |_| {
        Election::new(state, race_category, year, Some(district.clone()))
    }))
}
