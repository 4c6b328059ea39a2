use std::sync::LazyLock;

use regex::Regex;

use super::{DetailPage, RaceFamily, collect_detail_pages, parse_statewide, title_words, wiki_page};
use crate::parser::ParseError;
use crate::parser::tables::{ANY_VCARD, ELECTION_CAPTION_HEADER, GENERAL, RETENTION, TableStrategy};
use crate::types::ElectionResult;

pub const RACE_CATEGORY: &str = "State Supreme Court";

static RE_STATE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/wiki/(\d{4})_(\w+?)_Supreme_Court_election")
        .expect("invalid regex: supreme court page")
});

/// Contested races first, then retention (yes/no) votes.
const CHAIN: [TableStrategy; 4] = [GENERAL, ANY_VCARD, ELECTION_CAPTION_HEADER, RETENTION];

pub const FAMILY: RaceFamily = RaceFamily {
    key: "judicial",
    race_category: RACE_CATEGORY,
    race_categories: &[RACE_CATEGORY],
    index_locator,
    fallback_index_locator: None,
    list_detail_pages,
    parse_detail_page,
};

pub fn index_locator(year: u16) -> String {
    wiki_page(&format!("{}_United_States_judicial_elections", year))
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
    parse_statewide(state, html, year, RACE_CATEGORY, &CHAIN, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::test_support::index_html;

    #[test]
    fn test_list_detail_pages() {
        let html = index_html(&[
            "/wiki/2025_Wisconsin_Supreme_Court_election",
            "/wiki/2025_Pennsylvania_Supreme_Court_election",
            "/wiki/Supreme_Court_of_Wisconsin",
        ]);
        let pages = list_detail_pages(&html, 2025);

        let labels: Vec<_> = pages.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Wisconsin", "Pennsylvania"]);
    }

    #[test]
    fn test_parse_contested_election() {
        let html = r#"<html><body>
            <h3>General election</h3>
            <table class="wikitable plainrowheaders">
              <tr class="vcard"><td></td><td class="org">Nonpartisan</td><th><b><a href="/wiki/Susan_Crawford_(judge)">Susan Crawford</a></b></th><td>1,300,000</td><td>55.0</td></tr>
              <tr class="vcard"><td></td><td class="org">Nonpartisan</td><th><a href="/wiki/Brad_Schimel">Brad Schimel</a></th><td>1,060,000</td><td>45.0</td></tr>
            </table></body></html>"#;
        let results = parse_detail_page("Wisconsin", html, 2025).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].election.race_category, "State Supreme Court");
        assert_eq!(results[0].candidates[0].name, "Susan Crawford");
        assert!(results[0].candidates[0].is_winner);
    }

    #[test]
    fn test_parse_header_scoped_caption_table() {
        let html = r#"<html><body>
            <table class="wikitable">
              <caption>2024 Montana Supreme Court election</caption>
              <tr><th>Candidate</th><th>Votes</th><th>%</th></tr>
              <tr><th scope="row"><b><a href="/wiki/Katherine_Bidegaray">Katherine Bidegaray</a></b></th><td>300,000</td><td>54.9</td></tr>
              <tr><th scope="row">Jerry O'Neil</th><td>246,000</td><td>45.1</td></tr>
            </table></body></html>"#;
        let results = parse_detail_page("Montana", html, 2024).unwrap();

        assert_eq!(results.len(), 1);
        let names: Vec<_> = results[0].candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Katherine Bidegaray", "Jerry O'Neil"]);
        assert_eq!(results[0].candidates[0].party, "");
    }

    #[test]
    fn test_parse_retention_election() {
        let html = r#"<html><body>
            <table class="wikitable">
              <tr><th>Justice</th><th>Yes</th><th>No</th></tr>
              <tr><td><a href="/wiki/Christine_Donohue">Christine Donohue</a></td><td><b>Yes 61.2%</b></td><td>No 38.8%</td></tr>
              <tr><td><a href="/wiki/Kevin_Dougherty">Kevin Dougherty</a></td><td><b>Yes 60.5%</b></td><td>No 39.5%</td></tr>
            </table></body></html>"#;
        let results = parse_detail_page("Pennsylvania", html, 2025).unwrap();

        assert_eq!(results.len(), 1);
        let candidates = &results[0].candidates;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Christine Donohue");
        assert_eq!(candidates[0].vote_pct, Some(61.2));
        assert!(candidates.iter().all(|c| c.is_winner));
        assert_eq!(results[0].election.district, None);
    }
}
