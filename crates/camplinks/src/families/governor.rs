use std::sync::LazyLock;

use regex::Regex;

use super::{DetailPage, RaceFamily, collect_detail_pages, parse_statewide, title_words, wiki_page};
use crate::parser::ParseError;
use crate::parser::tables::GENERAL;
use crate::types::ElectionResult;

pub const RACE_CATEGORY: &str = "Governor";

static RE_STATE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/(\d{4})_(\w+)_gubernatorial_election$")
        .expect("invalid regex: gubernatorial state page")
});

pub const FAMILY: RaceFamily = RaceFamily {
    key: "governor",
    race_category: RACE_CATEGORY,
    race_categories: &[RACE_CATEGORY],
    index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

pub fn index_locator(year: u16) -> String {
    wiki_page(&format!("{}_United_States_gubernatorial_elections", year))
}

pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<DetailPage> {
    let year = year.to_string();
    collect_detail_pages(index_html, |href| {
        let caps = RE_STATE_PAGE.captures(href)?;
        (caps[1] == year).then(|| title_words(&caps[2]))
    })
}

pub fn parse_detail_page(
    state: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    parse_statewide(state, html, year, RACE_CATEGORY, &[GENERAL], true)
}
