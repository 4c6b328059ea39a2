use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::rows::{
    SEL_ROW, SEL_VCARD_ROW, parse_combined_sections, parse_header_scoped, parse_party_flagged,
    parse_ranked_choice, parse_retention,
};
use super::{caption_text, find_preceding_heading, has_class, is_general_election, stripped_text};
use crate::types::RawCandidate;

static SEL_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("invalid selector: table"));

static SEL_TH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("invalid selector: th"));

/// Which tables a strategy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFilter {
    /// `wikitable plainrowheaders` accepted by the general-election classifier.
    GeneralElection,
    AnyWikitable,
    /// Caption mentions "election".
    ElectionCaption,
    /// Header cells mention "votes" or "%".
    ResultsHeader,
    /// Caption names a congressional district or at-large seat.
    DistrictCaption,
    /// `wikitable sortable` with an election caption naming a district.
    SortableDistrictCaption,
    /// Table text mentions "retention" or "yes".
    RetentionText,
    /// Nearest preceding `h2`/`h3` mentions "district".
    DistrictHeading,
}

fn mentions_district(caption: &str) -> bool {
    caption.contains("congressional district") || caption.contains("at-large")
}

impl TableFilter {
    pub fn matches(&self, table: ElementRef) -> bool {
        if !has_class(table, "wikitable") {
            return false;
        }
        match self {
            TableFilter::GeneralElection => {
                has_class(table, "plainrowheaders") && is_general_election(table)
            }
            TableFilter::AnyWikitable => true,
            TableFilter::ElectionCaption => {
                caption_text(table).is_some_and(|c| c.contains("election"))
            }
            TableFilter::ResultsHeader => {
                let header_text = table
                    .select(&SEL_TH)
                    .map(|th| stripped_text(th).to_lowercase())
                    .collect::<Vec<_>>()
                    .join(" ");
                header_text.contains("votes") || header_text.contains('%')
            }
            TableFilter::DistrictCaption => caption_text(table).is_some_and(|c| mentions_district(&c)),
            TableFilter::SortableDistrictCaption => {
                has_class(table, "sortable")
                    && caption_text(table)
                        .is_some_and(|c| c.contains("election") && mentions_district(&c))
            }
            TableFilter::RetentionText => {
                let text = stripped_text(table).to_lowercase();
                text.contains("retention") || text.contains("yes")
            }
            TableFilter::DistrictHeading => find_preceding_heading(table, &["h2", "h3"])
                .is_some_and(|h| stripped_text(h).to_lowercase().contains("district")),
        }
    }
}

/// How candidate rows are read out of a matching table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    PartyFlagged,
    HeaderScoped,
    RankedChoice,
    Retention,
    CombinedSections,
}

impl RowLayout {
    /// Read one row. Combined-section tables are stateful across rows, so a
    /// single row is read with the party-flagged rules.
    pub fn extract_row(&self, row: ElementRef) -> Option<RawCandidate> {
        match self {
            RowLayout::PartyFlagged | RowLayout::CombinedSections => parse_party_flagged(row),
            RowLayout::HeaderScoped => parse_header_scoped(row),
            RowLayout::RankedChoice => parse_ranked_choice(row),
            RowLayout::Retention => parse_retention(row),
        }
    }

    pub fn extract_rows(&self, table: ElementRef) -> Vec<RawCandidate> {
        match self {
            RowLayout::CombinedSections => parse_combined_sections(table),
            RowLayout::PartyFlagged => table
                .select(&SEL_VCARD_ROW)
                .filter_map(|row| self.extract_row(row))
                .collect(),
            _ => table
                .select(&SEL_ROW)
                .filter_map(|row| self.extract_row(row))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableStrategy {
    pub name: &'static str,
    pub filter: TableFilter,
    pub layout: RowLayout,
}

impl TableStrategy {
    pub const fn new(name: &'static str, filter: TableFilter, layout: RowLayout) -> Self {
        Self {
            name,
            filter,
            layout,
        }
    }
}

pub const GENERAL: TableStrategy = TableStrategy::new(
    "general-election",
    TableFilter::GeneralElection,
    RowLayout::PartyFlagged,
);

pub const ANY_VCARD: TableStrategy =
    TableStrategy::new("any-vcard", TableFilter::AnyWikitable, RowLayout::PartyFlagged);

pub const RANKED_CHOICE: TableStrategy = TableStrategy::new(
    "ranked-choice",
    TableFilter::SortableDistrictCaption,
    RowLayout::RankedChoice,
);

pub const COMBINED_SECTIONS: TableStrategy = TableStrategy::new(
    "combined-sections",
    TableFilter::DistrictCaption,
    RowLayout::CombinedSections,
);

pub const ELECTION_CAPTION_HEADER: TableStrategy = TableStrategy::new(
    "election-caption-header",
    TableFilter::ElectionCaption,
    RowLayout::HeaderScoped,
);

pub const RETENTION: TableStrategy =
    TableStrategy::new("retention", TableFilter::RetentionText, RowLayout::Retention);

pub const RESULTS_VCARD: TableStrategy = TableStrategy::new(
    "results-vcard",
    TableFilter::ResultsHeader,
    RowLayout::PartyFlagged,
);

pub const RESULTS_HEADER: TableStrategy = TableStrategy::new(
    "results-header",
    TableFilter::ResultsHeader,
    RowLayout::HeaderScoped,
);

pub const DISTRICT_HEADING_VCARD: TableStrategy = TableStrategy::new(
    "district-heading-vcard",
    TableFilter::DistrictHeading,
    RowLayout::PartyFlagged,
);

/// A table that yielded at least one candidate row.
#[derive(Debug, Clone)]
pub struct ExtractedTable<'a> {
    pub strategy: &'static str,
    pub table: ElementRef<'a>,
    pub rows: Vec<RawCandidate>,
}

/// Apply a single strategy to every table in the document.
pub fn apply_strategy<'a>(document: &'a Html, strategy: &TableStrategy) -> Vec<ExtractedTable<'a>> {
    document
        .select(&SEL_TABLE)
        .filter(|table| strategy.filter.matches(*table))
        .filter_map(|table| {
            let rows: Vec<RawCandidate> = strategy
                .layout
                .extract_rows(table)
                .into_iter()
                .filter(|r| !r.name.is_empty())
                .collect();
            (!rows.is_empty()).then_some(ExtractedTable {
                strategy: strategy.name,
                table,
                rows,
            })
        })
        .collect()
}

/// Try each strategy in order and return the tables of the first one that
/// yields anything.
pub fn run_strategies<'a>(document: &'a Html, chain: &[TableStrategy]) -> Vec<ExtractedTable<'a>> {
    for strategy in chain {
        let tables = apply_strategy(document, strategy);
        if !tables.is_empty() {
            log::debug!(
                "Strategy '{}' matched {} table(s)",
                strategy.name,
                tables.len()
            );
            return tables;
        }
    }
    Vec::new()
}
