use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::{RaceFamily, collect_detail_pages, tables_to_results, title_words, wiki_page};
use crate::parser::tables::{COMBINED_SECTIONS, GENERAL, RANKED_CHOICE, apply_strategy, run_strategies};
use crate::parser::{ParseError, caption_text, ensure_not_empty, extract_district, find_preceding_heading, stripped_text};
use crate::types::{AT_LARGE, Election, ElectionResult};

pub const RACE_CATEGORY: &str = "US House";

static RE_STATE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/(\d{4})_United_States_House_of_Representatives_elections?_in_(.+)$")
        .expect("invalid regex: house state page")
});

pub const FAMILY: RaceFamily = RaceFamily {
    key: "house",
    race_category: RACE_CATEGORY,
    race_categories: &[RACE_CATEGORY],
    index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

pub fn index_locator(year: u16) -> String {
    wiki_page(&format!("{}_United_States_House_of_Representatives_elections", year))
}

pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<super::DetailPage> {
    let year = year.to_string();
    collect_detail_pages(index_html, |href| {
        let caps = RE_STATE_PAGE.captures(href)?;
        (caps[1] == year).then(|| title_words(&caps[2]))
    })
}

/// District results for one state. California publishes primary and general
/// rounds in one table per district; ranked-choice states use sortable
/// tables when no standard general-election table exists.
pub fn parse_detail_page(
    state: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    ensure_not_empty(html, state)?;
    let document = Html::parse_document(html);

    if state.eq_ignore_ascii_case("california") {
        let tables = apply_strategy(&document, &COMBINED_SECTIONS);
        return Ok(tables_to_results(&tables, |t| {
            let text = find_preceding_heading(t.table, &["h2"])
                .map(stripped_text)
                .or_else(|| caption_text(t.table))
                .unwrap_or_default();
            Election::new(state, RACE_CATEGORY, year, Some(extract_district(&text)))
        }));
    }

    let tables = run_strategies(&document, &[GENERAL, RANKED_CHOICE]);
    Ok(tables_to_results(&tables, |t| {
        let district = if t.strategy == RANKED_CHOICE.name {
            extract_district(&caption_text(t.table).unwrap_or_default())
        } else {
            find_preceding_heading(t.table, &["h2"])
                .map(|h| extract_district(&stripped_text(h)))
                .unwrap_or_else(|| AT_LARGE.to_string())
        };
        Election::new(state, RACE_CATEGORY, year, Some(district))
    }))
}
