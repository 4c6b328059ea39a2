use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::{DetailPage, RaceFamily, collect_detail_pages, house, tables_to_results, title_words};
use crate::parser::tables::{ANY_VCARD, GENERAL, run_strategies};
use crate::parser::{ParseError, ensure_not_empty, extract_district, page_title};
use crate::types::{AT_LARGE, Election, ElectionResult};

static RE_SPECIAL_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/(\d{4})_[\w%']+congressional_district_special_election")
        .expect("invalid regex: special election page")
});

static RE_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/\d{4}_([A-Z]\w+?)(?:%27s|'s)_").expect("invalid regex: special state")
});

/// Special elections share the House index; each page covers one district.
pub const FAMILY: RaceFamily = RaceFamily {
    key: "special_house",
    race_category: house::RACE_CATEGORY,
    race_categories: &[house::RACE_CATEGORY],
    index_locator: house::index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

pub fn list_detail_pages(index_html: &str, year: u16) -> Vec<DetailPage> {
    let year = year.to_string();
    collect_detail_pages(index_html, |href| {
        let caps = RE_SPECIAL_PAGE.captures(href)?;
        if caps[1] != year {
            return None;
        }
        let state = RE_STATE
            .captures(href)
            .map(|c| title_words(&c[1]))
            .unwrap_or_else(|| "Unknown".to_string());
        Some(state)
    })
}

/// District comes from the page title, e.g. "2025 Florida's 1st
/// congressional district special election".
pub fn parse_detail_page(
    state: &str,
    html: &str,
    year: u16,
) -> Result<Vec<ElectionResult>, ParseError> {
    ensure_not_empty(html, state)?;
    let document = Html::parse_document(html);

    let title = page_title(&document);
    let district = if title.is_empty() {
        AT_LARGE.to_string()
    } else {
        extract_district(&title)
    };

    let tables = run_strategies(&document, &[GENERAL, ANY_VCARD]);
    let mut results = tables_to_results(&tables, |_| {
        Election::new(state, house::RACE_CATEGORY, year, Some(district.clone()))
    });
    results.truncate(1);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::test_support::index_html;

    #[test]
    fn test_list_detail_pages() {
        let html = index_html(&[
            "/wiki/2025_Florida%27s_1st_congressional_district_special_election",
            "/wiki/2025_Arizona's_7th_congressional_district_special_election",
            "/wiki/2024_United_States_House_of_Representatives_elections_in_Ohio",
            "/wiki/2023_Utah%27s_2nd_congressional_district_special_election",
        ]);
        let pages = list_detail_pages(&html, 2025);

        let labels: Vec<_> = pages.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Florida", "Arizona"]);
    }

    #[test]
    fn test_parse_district_from_title() {
        let html = r#"<html><head><title>2025 Florida's 6th congressional district special election - Wikipedia</title></head>
            <body>
            <table class="wikitable">
              <tr class="vcard"><td></td><td class="org">Republican</td><th><b><a href="/wiki/Randy_Fine">Randy Fine</a></b></th><td>110,000</td><td>56.7</td></tr>
              <tr class="vcard"><td></td><td class="org">Democratic</td><th>Josh Weil</th><td>84,000</td><td>43.3</td></tr>
            </table></body></html>"#;
        let results = parse_detail_page("Florida", html, 2025).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].election.district.as_deref(), Some("6"));
        assert_eq!(results[0].election.race_category, "US House");
        assert_eq!(results[0].candidates[0].name, "Randy Fine");
        assert!(results[0].candidates[0].is_winner);
    }
}
