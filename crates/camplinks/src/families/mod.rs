//! Race families: where each kind of race is indexed and how its detail
//! pages are read.

pub mod attorney_general;
pub mod governor;
pub mod house;
pub mod judicial;
pub mod municipal;
pub mod senate;
pub mod special_house;
pub mod state_leg;
pub mod state_leg_special;

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::BASE_URL;
use crate::parser::tables::{ExtractedTable, TableStrategy, run_strategies};
use crate::parser::{ParseError, ensure_not_empty, normalize};
use crate::types::{Election, ElectionResult};

static SEL_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: a[href]"));

/// A page linked from a family's index, labelled with the jurisdiction it
/// covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub label: String,
    pub url: String,
}

pub type IndexLocator = fn(u16) -> String;
pub type DetailLister = fn(&str, u16) -> Vec<DetailPage>;
pub type DetailParser = fn(&str, &str, u16) -> Result<Vec<ElectionResult>, ParseError>;

/// Everything the pipeline needs to scrape one kind of race.
#[derive(Debug, Clone, Copy)]
pub struct RaceFamily {
    pub key: &'static str,
    pub race_category: &'static str,
    /// Categories this family writes; legislative families pick the chamber
    /// per page.
    pub race_categories: &'static [&'static str],
    pub index_locator: IndexLocator,
    /// Tried when the primary index cannot be fetched.
    pub fallback_index_locator: Option<IndexLocator>,
    /// `(index_html, year)`
    pub list_detail_pages: DetailLister,
    /// `(label, detail_html, year)`
    pub parse_detail_page: DetailParser,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown race family '{key}'. Accepted values: 'all', {accepted}")]
pub struct UnknownFamily {
    key: String,
    accepted: String,
}

/// The race families known to the pipeline, in scrape order.
#[derive(Debug, Clone)]
pub struct Registry {
    families: Vec<RaceFamily>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            families: vec![
                house::FAMILY,
                senate::FAMILY,
                governor::FAMILY,
                attorney_general::FAMILY,
                judicial::FAMILY,
                municipal::FAMILY,
                special_house::FAMILY,
                state_leg::FAMILY,
                state_leg_special::FAMILY,
            ],
        }
    }

    pub fn get(&self, key: &str) -> Option<&RaceFamily> {
        self.families.iter().find(|f| f.key == key)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.families.iter().map(|f| f.key).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaceFamily> {
        self.families.iter()
    }

    /// Families selected by a CLI race argument: a family key or `all`.
    pub fn select(&self, race: &str) -> Result<Vec<&RaceFamily>, UnknownFamily> {
        if race == "all" {
            return Ok(self.families.iter().collect());
        }
        self.get(race).map(|f| vec![f]).ok_or_else(|| UnknownFamily {
            key: race.to_string(),
            accepted: self
                .names()
                .iter()
                .map(|n| format!("'{}'", n))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

pub(crate) fn wiki_page(title: &str) -> String {
    format!("{}/wiki/{}", BASE_URL, title)
}

/// Turn `_`-separated title fragments into readable text.
pub(crate) fn title_words(fragment: &str) -> String {
    fragment.replace("%27", "'").replace('_', " ").trim().to_string()
}

/// `/wiki/` hrefs under `root`, with any `#fragment` removed.
pub(crate) fn wiki_anchors<'a>(root: ElementRef<'a>) -> impl Iterator<Item = (ElementRef<'a>, &'a str)> {
    root.select(&SEL_HREF).filter_map(|a| {
        let href = a.value().attr("href")?;
        let href = href.split('#').next().unwrap_or(href);
        href.starts_with("/wiki/").then_some((a, href))
    })
}

/// Detail pages de-duplicated by href in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct DetailPageSet {
    seen: HashSet<String>,
    pages: Vec<DetailPage>,
}

impl DetailPageSet {
    pub(crate) fn contains(&self, href: &str) -> bool {
        self.seen.contains(href)
    }

    pub(crate) fn push(&mut self, href: &str, label: String) {
        if self.seen.insert(href.to_string()) {
            self.pages.push(DetailPage {
                label,
                url: format!("{}{}", BASE_URL, href),
            });
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn into_pages(self) -> Vec<DetailPage> {
        self.pages
    }
}

/// Collect every `/wiki/` link of the index page that `label_for` accepts.
pub(crate) fn collect_detail_pages(
    index_html: &str,
    label_for: impl Fn(&str) -> Option<String>,
) -> Vec<DetailPage> {
    let document = Html::parse_document(index_html);
    let mut pages = DetailPageSet::default();
    for (_, href) in wiki_anchors(document.root_element()) {
        if pages.contains(href) {
            continue;
        }
        if let Some(label) = label_for(href) {
            pages.push(href, label);
        }
    }
    pages.into_pages()
}

/// One election per extracted table that still has candidates after
/// normalization.
pub(crate) fn tables_to_results(
    tables: &[ExtractedTable],
    mut election_for: impl FnMut(&ExtractedTable) -> Election,
) -> Vec<ElectionResult> {
    tables
        .iter()
        .filter_map(|table| {
            let candidates = normalize(table.rows.clone());
            (!candidates.is_empty()).then(|| ElectionResult {
                election: election_for(table),
                candidates,
            })
        })
        .collect()
}

/// Statewide races: no district, jurisdiction from the page label.
pub(crate) fn parse_statewide(
    label: &str,
    html: &str,
    year: u16,
    race_category: &str,
    chain: &[TableStrategy],
    first_only: bool,
) -> Result<Vec<ElectionResult>, ParseError> {
    ensure_not_empty(html, label)?;
    let document = Html::parse_document(html);
    let tables = run_strategies(&document, chain);
    let mut results =
        tables_to_results(&tables, |_| Election::new(label, race_category, year, None));
    if first_only {
        results.truncate(1);
    }
    Ok(results)
}
