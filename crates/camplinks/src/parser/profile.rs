use std::collections::BTreeMap;
use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use super::{SEL_LINK, has_class, stripped_text};

static SEL_PERSON_INFOBOX: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.infobox.person").expect("invalid selector: person infobox")
});

static SEL_WIDGET_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.widget-row").expect("invalid selector: widget row"));

/// Whether `url` is a single profile page on `domain`, as opposed to a
/// `/wiki/` listing or category page.
pub fn is_profile_item_url(url: &str, domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let on_domain = parsed
        .host_str()
        .is_some_and(|h| h == domain || h.ends_with(&format!(".{}", domain)));
    on_domain && !parsed.path().starts_with("/wiki/")
}

/// Harvest the "Contact" panel of a profile page: lower-cased link label to
/// URL.
///
/// Rows are collected from the header onwards while they keep the contact
/// section's `white` style; the first row with another style starts the
/// next section.
pub fn extract_contact_links(html: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(html);
    let mut links = BTreeMap::new();

    let Some(infobox) = document.select(&SEL_PERSON_INFOBOX).next() else {
        return links;
    };
    let Some(header) = infobox
        .select(&SEL_WIDGET_ROW)
        .find(|row| stripped_text(*row) == "Contact")
    else {
        return links;
    };

    let rows = header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "div" && has_class(*e, "widget-row"));
    for row in rows {
        if !has_class(row, "white") {
            break;
        }
        let Some(a) = row.select(&SEL_LINK).next() else {
            continue;
        };
        let Some(href) = a.value().attr("href").filter(|h| !h.is_empty()) else {
            continue;
        };
        links.insert(stripped_text(a).to_lowercase(), href.to_string());
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {path}: {e}"))
    }

    #[test]
    fn test_contact_panel_stops_at_next_section() {
        let links = extract_contact_links(&fixture("profile_page.html"));

        assert_eq!(links.len(), 4);
        assert_eq!(
            links.get("campaign website").map(String::as_str),
            Some("https://www.johnsmithforcongress.com/")
        );
        assert_eq!(
            links.get("campaign facebook").map(String::as_str),
            Some("https://www.facebook.com/johnsmithforcongress")
        );
        assert_eq!(
            links.get("campaign x").map(String::as_str),
            Some("https://x.com/smith4ohio")
        );
        assert_eq!(
            links.get("personal linkedin").map(String::as_str),
            Some("https://www.linkedin.com/in/johnsmith")
        );
        assert!(!links.contains_key("official website"));
    }

    #[test]
    fn test_no_contact_panel() {
        let html = r#"<div class="infobox person"><div class="widget-row value-only">Bio</div></div>"#;
        assert!(extract_contact_links(html).is_empty());
        assert!(extract_contact_links("<p>nothing</p>").is_empty());
    }

    #[test]
    fn test_is_profile_item_url() {
        let domain = "ballotpedia.org";
        assert!(is_profile_item_url("https://ballotpedia.org/John_Smith_(Ohio)", domain));
        assert!(is_profile_item_url("https://www.ballotpedia.org/John_Smith", domain));
        assert!(!is_profile_item_url("https://ballotpedia.org/wiki/index.php?search=Smith", domain));
        assert!(!is_profile_item_url("https://en.wikipedia.org/wiki/John_Smith", domain));
        assert!(!is_profile_item_url("not a url", domain));
    }
}
