use std::sync::LazyLock;

use regex::Regex;

use crate::types::AT_LARGE;

static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:st|nd|rd|th)").expect("invalid regex: ordinal"));

static RE_AT_LARGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)at.large").expect("invalid regex: at-large"));

static RE_DISTRICT_N: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Dd]istrict\s+(\d+)").expect("invalid regex: district n"));

static RE_ANY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("invalid regex: number"));

/// Parse a district identifier out of a heading, caption or page title.
///
/// Falls back to [`AT_LARGE`] when the text names no district number.
pub fn extract_district(text: &str) -> String {
    if RE_AT_LARGE.is_match(text) {
        return AT_LARGE.to_string();
    }
    if let Some(caps) = RE_ORDINAL.captures(text) {
        return caps[1].to_string();
    }
    if let Some(caps) = RE_DISTRICT_N.captures(text) {
        return caps[1].to_string();
    }
    let lower = text.trim().to_lowercase();
    if lower.contains("general election") || lower.contains("results") {
        return AT_LARGE.to_string();
    }
    RE_ANY_NUMBER
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| AT_LARGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_district() {
        let cases = [
            ("District 3[edit]", "3"),
            ("1st congressional district", "1"),
            ("2nd congressional district", "2"),
            ("23rd congressional district", "23"),
            ("At-large district", AT_LARGE),
            ("at large", AT_LARGE),
            ("General election[edit]", AT_LARGE),
            ("Results", AT_LARGE),
            ("Seat 14", "14"),
            ("", AT_LARGE),
        ];

        for (text, expected) in cases {
            assert_eq!(extract_district(text), expected, "input: {:?}", text);
        }
    }

    #[test]
    fn test_extract_district_from_page_title() {
        assert_eq!(
            extract_district("2025 Virginia's 11th congressional district special election - Wikipedia"),
            "11"
        );
    }
}
