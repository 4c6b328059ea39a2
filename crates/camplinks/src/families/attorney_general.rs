use std::sync::LazyLock;

use regex::Regex;

use super::{DetailPage, RaceFamily, collect_detail_pages, governor, parse_statewide, title_words, wiki_page};
use crate::parser::ParseError;
use crate::parser::tables::GENERAL;
use crate::types::ElectionResult;

pub const RACE_CATEGORY: &str = "Attorney General";

static RE_STATE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/(\d{4})_(\w+?)_[Aa]ttorney_[Gg]eneral_election$")
        .expect("invalid regex: attorney general state page")
});

/// Attorney general races are also linked from the gubernatorial index,
/// which exists for years without a dedicated index page.
pub const FAMILY: RaceFamily = RaceFamily {
    key: "attorney_general",
    race_category: RACE_CATEGORY,
    race_categories: &[RACE_CATEGORY],
    index_locator,
    fallback_index_locator: Some(governor::index_locator),
    list_detail_pages,
    parse_detail_page,
};

pub fn index_locator(year: u16) -> String {
    wiki_page(&format!("{}_United_States_attorney_general_elections", year))
}

pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<DetailPage> {
    let year_text = year.to_string();
    let pages = collect_detail_pages(index_html, |href| {
        let caps = RE_STATE_PAGE.captures(href)?;
        (caps[1] == year_text).then(|| title_words(&caps[2]))
    });
    if pages.is_empty() {
        log::warn!("No attorney general election links found for {}", year);
    }
    pages
}

pub fn parse_detail_page(
    state: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    parse_statewide(state, html, year, RACE_CATEGORY, &[GENERAL], true)
}
