use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{
    SEL_LINK, elem_text, has_class, is_bold, normalize_whitespace, row_cells, stripped_text,
    strip_incumbent, wiki_url,
};
use crate::types::RawCandidate;

static RE_PLAIN_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?%?$").expect("invalid regex: plain number")
});

static RE_BOLD_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-weight\s*:\s*bold").expect("invalid regex: bold style"));

static SEL_ROW_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"th[scope="row"]"#).expect("invalid selector: row header"));

static SEL_STYLED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style]").expect("invalid selector: styled"));

static SEL_VCARD_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.vcard").expect("invalid selector: span.vcard"));

static SEL_TH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("invalid selector: th"));

pub(crate) static SEL_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: tr"));

pub(crate) static SEL_VCARD_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.vcard").expect("invalid selector: tr.vcard"));

fn colspan(cell: ElementRef) -> u32 {
    cell.value()
        .attr("colspan")
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(1)
}

fn cell_name(cell: ElementRef) -> String {
    strip_incumbent(&normalize_whitespace(&elem_text(cell)))
}

fn is_numeric_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '%' | ' '))
}

/// `/wiki/` biography link of the first anchor inside `cell`.
fn biography_link(cell: ElementRef) -> String {
    cell.select(&SEL_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(wiki_url)
        .unwrap_or_default()
}

fn parse_percent(text: &str) -> Option<f64> {
    text.replace([',', '%'], "").trim().parse().ok()
}

/// Vote share from the right-most cell holding a plain unsigned number in
/// the 0-100 range. Vote counts fall outside the range and swing columns
/// carry a sign, so neither is mistaken for a share.
pub(crate) fn trailing_vote_share(cells: &[ElementRef]) -> Option<f64> {
    cells.iter().rev().find_map(|cell| {
        let text = stripped_text(*cell);
        if !RE_PLAIN_NUMBER.is_match(&text) {
            return None;
        }
        parse_percent(&text).filter(|v| (0.0..=100.0).contains(v))
    })
}

/// Party-flagged row (`tr.vcard`): an `org` cell carries the party and the
/// name sits next to it, or two cells over when the party cell spans two
/// columns.
pub fn parse_party_flagged(row: ElementRef) -> Option<RawCandidate> {
    let cells = row_cells(row);
    if cells.len() < 4 {
        return None;
    }

    let (party_cell, name_idx) = match cells.iter().position(|c| has_class(*c, "org")) {
        Some(i) if colspan(cells[i]) >= 2 => (cells[i], i + 2),
        Some(i) => (cells[i], i + 1),
        None if cells.len() >= 5 => (cells[1], 2),
        None => return None,
    };
    let name_cell = *cells.get(name_idx)?;

    let name = cell_name(name_cell);
    if name.is_empty() || is_numeric_name(&name) {
        return None;
    }

    Some(RawCandidate {
        party: normalize_whitespace(&elem_text(party_cell)),
        name,
        link: biography_link(name_cell),
        vote_pct: trailing_vote_share(&cells[name_idx + 1..]),
        is_winner: is_bold(name_cell),
    })
}

/// Header-scoped row: the name lives in `th[scope=row]` and no party is
/// given.
pub fn parse_header_scoped(row: ElementRef) -> Option<RawCandidate> {
    let header = row.select(&SEL_ROW_HEADER).next()?;
    let name = cell_name(header);
    if name.is_empty() || is_numeric_name(&name) {
        return None;
    }

    let is_winner = is_bold(header)
        || row.select(&SEL_STYLED).any(|e| {
            e.value()
                .attr("style")
                .is_some_and(|s| RE_BOLD_STYLE.is_match(s))
        });

    let cells = row_cells(row);
    let trailing = cells
        .iter()
        .position(|c| c.id() == header.id())
        .map(|i| &cells[i + 1..])
        .unwrap_or(&cells[..]);
    let data_cells: Vec<ElementRef> = trailing
        .iter()
        .copied()
        .filter(|c| c.value().name() == "td")
        .collect();

    Some(RawCandidate {
        party: String::new(),
        name,
        link: biography_link(header),
        vote_pct: trailing_vote_share(&data_cells),
        is_winner,
    })
}

/// Ranked-choice row: the candidate is marked with a `span.vcard` and the
/// final-round share is the last cell containing a percent sign.
pub fn parse_ranked_choice(row: ElementRef) -> Option<RawCandidate> {
    let cells = row_cells(row);
    if cells.len() < 4 {
        return None;
    }
    let vcard = row.select(&SEL_VCARD_SPAN).next()?;

    let party = cells
        .iter()
        .filter_map(|c| c.select(&SEL_LINK).next())
        .find_map(|a| {
            let text = stripped_text(a).to_lowercase();
            if text.contains("republican") {
                Some("Republican")
            } else if text.contains("democrat") {
                Some("Democratic")
            } else {
                None
            }
        })
        .unwrap_or_default()
        .to_string();

    let (name, link) = match vcard.select(&SEL_LINK).next() {
        Some(a) => (
            cell_name(a),
            a.value().attr("href").map(wiki_url).unwrap_or_default(),
        ),
        None => (cell_name(vcard), String::new()),
    };
    if name.is_empty() {
        return None;
    }

    let pct_cell = cells
        .iter()
        .rev()
        .find(|c| stripped_text(**c).contains('%'))
        .copied();

    Some(RawCandidate {
        party,
        name,
        link,
        vote_pct: pct_cell.and_then(|c| parse_percent(&stripped_text(c))),
        is_winner: pct_cell.is_some_and(is_bold),
    })
}

/// Retention row: one justice, retained when the "yes" share is above half.
pub fn parse_retention(row: ElementRef) -> Option<RawCandidate> {
    let cells = row_cells(row);
    if cells.len() < 3 {
        return None;
    }

    let name_cell = cells.iter().copied().find(|cell| {
        let has_wiki_link = cell
            .select(&SEL_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .is_some_and(|href| href.starts_with("/wiki/"));
        if !has_wiki_link {
            return false;
        }
        let text = stripped_text(*cell).to_lowercase();
        !text.is_empty() && text != "yes" && text != "no"
    })?;

    let name = cell_name(name_cell);
    if name.is_empty() {
        return None;
    }

    let mut yes_pct = None;
    for cell in &cells {
        let text = stripped_text(*cell).to_lowercase();
        if !text.contains('%') || !(text.contains("yes") || is_bold(*cell)) {
            continue;
        }
        let cleaned = text.replace(',', "").replace('%', " ");
        if let Some(v) = cleaned.split_whitespace().find_map(|p| p.parse::<f64>().ok()) {
            yes_pct = Some(v);
        }
    }

    Some(RawCandidate {
        party: String::new(),
        name,
        link: biography_link(name_cell),
        vote_pct: yes_pct,
        is_winner: yes_pct.is_some_and(|v| v > 50.0),
    })
}

/// Combined primary/general table: rows before the "General election"
/// section header are ignored, and a new header restarts the collection.
pub fn parse_combined_sections(table: ElementRef) -> Vec<RawCandidate> {
    let mut in_general = false;
    let mut parsed = Vec::new();

    for row in table.select(&SEL_ROW) {
        if let Some(th) = row.select(&SEL_TH).next() {
            let text = stripped_text(th).to_lowercase();
            if text.contains("general election") && colspan(th) >= 3 {
                in_general = true;
                parsed.clear();
                continue;
            }
        }

        if in_general && has_class(row, "vcard") {
            parsed.extend(parse_party_flagged(row));
        }
    }

    parsed
}
