use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use super::{has_class, stripped_text};

static SEL_INFOBOX: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.infobox").expect("invalid selector: infobox"));

static SEL_INFOBOX_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("th.infobox-label").expect("invalid selector: infobox label")
});

static SEL_EXTERNAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.external").expect("invalid selector: a.external"));

static SEL_EXTERNAL_LINKS_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2#External_links, span#External_links")
        .expect("invalid selector: external links anchor")
});

fn href(a: ElementRef) -> Option<String> {
    a.value().attr("href").map(str::to_string)
}

fn is_government_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().is_some_and(|h| h.contains(".gov")),
        Err(_) => url.contains(".gov"),
    }
}

fn is_heading(element: ElementRef) -> bool {
    let name = element.value().name();
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        || (name == "div" && has_class(element, "mw-heading"))
}

fn from_infobox(document: &Html) -> Option<String> {
    let infobox = document.select(&SEL_INFOBOX).next()?;

    for label in infobox.select(&SEL_INFOBOX_LABEL) {
        if stripped_text(label).to_lowercase() != "website" {
            continue;
        }
        let Some(data) = label
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "td" && has_class(*e, "infobox-data"))
        else {
            continue;
        };

        let links: Vec<ElementRef> = data.select(&SEL_EXTERNAL).collect();
        if let Some(campaign) = links
            .iter()
            .find(|a| stripped_text(**a).to_lowercase().contains("campaign"))
        {
            return href(*campaign);
        }
        if let [only] = links.as_slice() {
            return href(*only);
        }
        if let Some(url) = links
            .iter()
            .filter_map(|a| href(*a))
            .find(|url| !is_government_url(url))
        {
            return Some(url);
        }
    }
    None
}

fn from_external_links(document: &Html) -> Option<String> {
    let anchor = document.select(&SEL_EXTERNAL_LINKS_ANCHOR).next()?;
    let heading = if anchor.value().name() == "span" {
        anchor.parent().and_then(ElementRef::wrap)?
    } else {
        anchor
    };
    let container = heading
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|p| p.value().name() == "div" && has_class(*p, "mw-heading"))
        .unwrap_or(heading);

    for sibling in container.next_siblings().filter_map(ElementRef::wrap) {
        if is_heading(sibling) {
            break;
        }
        if sibling.value().name() != "ul" {
            continue;
        }
        let items = sibling
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "li");
        for item in items {
            if !stripped_text(item).to_lowercase().contains("campaign") {
                continue;
            }
            if let Some(url) = item.select(&SEL_EXTERNAL).next().and_then(href) {
                return Some(url);
            }
        }
    }
    None
}

/// Campaign website linked from a biography page, or an empty string.
///
/// The infobox "Website" row is preferred; the "External links" section is
/// the fallback.
pub fn extract_campaign_site(html: &str) -> String {
    let document = Html::parse_document(html);
    from_infobox(&document)
        .or_else(|| from_external_links(&document))
        .unwrap_or_default()
}
