//! Heuristic ranking of web search hits as likely campaign websites.

use reqwest::Url;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::SearchHit;

/// Hosts that never serve a candidate's own campaign site: reference
/// sites, social networks and news outlets.
pub const SKIP_DOMAINS: [&str; 26] = [
    "ballotpedia.org",
    "wikipedia.org",
    "fec.gov",
    "opensecrets.org",
    "facebook.com",
    "twitter.com",
    "x.com",
    "youtube.com",
    "linkedin.com",
    "instagram.com",
    "reddit.com",
    "tiktok.com",
    "nytimes.com",
    "cnn.com",
    "foxnews.com",
    "washingtonpost.com",
    "politico.com",
    "nbcnews.com",
    "abcnews.go.com",
    "cbsnews.com",
    "apnews.com",
    "reuters.com",
    "thehill.com",
    "npr.org",
    "bbc.com",
    "usatoday.com",
];

const CAMPAIGN_TOKENS: [&str; 6] = [
    "forcongress",
    "forsenate",
    "elect",
    "vote",
    "campaign",
    "committee",
];

const NAME_SUFFIXES: [&str; 7] = ["jr", "sr", "ii", "iii", "iv", "v", "md"];

const ROOT_PATHS: [&str; 3] = ["", "/", "/index.html"];

fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '-'))
        .collect::<String>()
        .to_lowercase()
}

/// Last name token that is not a generational suffix, lower-cased with
/// diacritics, apostrophes and hyphens removed.
pub fn surname(name: &str) -> String {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    tokens
        .iter()
        .rev()
        .map(|t| t.trim_matches(|c: char| c == '.' || c == ','))
        .find(|t| !t.is_empty() && !NAME_SUFFIXES.contains(&t.to_lowercase().as_str()))
        .map(fold)
        .unwrap_or_else(|| fold(name.trim()))
}

/// `host` is `domain` itself or one of its subdomains.
fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Score in `0.0..=1.0` for `hit` being the campaign site of `name` running
/// in `jurisdiction`. Hosts on the skip list, the profile domain or a
/// government domain score zero.
pub fn score_hit(hit: &SearchHit, name: &str, jurisdiction: &str, profile_domain: &str) -> f64 {
    let Ok(url) = Url::parse(&hit.url) else {
        return 0.0;
    };
    let Some(host) = url.host_str().map(str::to_lowercase) else {
        return 0.0;
    };

    let skipped = SKIP_DOMAINS
        .iter()
        .chain(std::iter::once(&profile_domain))
        .any(|d| domain_matches(&host, d));
    if skipped || host.contains(".gov") {
        return 0.0;
    }

    let mut score = 0.0;
    let host_clean = host.replace(['-', '.'], "");

    let last = surname(name);
    if !last.is_empty() && host_clean.contains(&last) {
        score += 0.4;
    }
    if CAMPAIGN_TOKENS.iter().any(|t| host_clean.contains(t)) {
        score += 0.2;
    }
    if ROOT_PATHS.contains(&url.path()) {
        score += 0.1;
    }

    let text = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    if ["campaign", "congress", "senate"].iter().any(|w| text.contains(w)) {
        score += 0.1;
    }
    if text.contains("official") {
        score += 0.05;
    }
    if !jurisdiction.is_empty() && text.contains(&jurisdiction.to_lowercase()) {
        score += 0.05;
    }
    if host.ends_with(".com") || host.ends_with(".org") {
        score += 0.05;
    }

    f64::min(score, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hit;

    const PROFILE: &str = "ballotpedia.org";

    #[test]
    fn test_campaign_domain_scores_high() {
        let h = hit(
            "John Smith for Congress",
            "https://smithforcongress.com/",
            "Official campaign website",
        );
        let score = score_hit(&h, "John Smith", "Ohio", PROFILE);
        assert!(score >= 0.5, "score was {}", score);
        assert!((score - 0.9).abs() < 1e-9, "score was {}", score);
    }

    #[test]
    fn test_skip_domains_score_zero() {
        let news = hit("John Smith wins", "https://www.nytimes.com/2024/smith", "campaign");
        assert_eq!(score_hit(&news, "John Smith", "Ohio", PROFILE), 0.0);

        let profile = hit("John Smith", "https://ballotpedia.org/John_Smith", "");
        assert_eq!(score_hit(&profile, "John Smith", "Ohio", PROFILE), 0.0);

        let custom = hit("John Smith", "https://votesmart.org/smith", "");
        assert_eq!(score_hit(&custom, "John Smith", "Ohio", "votesmart.org"), 0.0);
    }

    #[test]
    fn test_lookalike_hosts_not_skipped() {
        let h = hit("Jane Fox for Congress", "https://votefox.com/", "Official campaign site");
        let score = score_hit(&h, "Jane Fox", "Ohio", PROFILE);
        assert!(score > 0.0, "score was {}", score);

        let h = hit("Tom Knox", "https://electknox.com/", "");
        assert!(score_hit(&h, "Tom Knox", "Ohio", PROFILE) > 0.0);

        let h = hit("Ann Lee", "https://annleeballotpedia.org/", "");
        assert!(score_hit(&h, "Ann Lee", "Ohio", PROFILE) > 0.0);
    }

    #[test]
    fn test_skip_domain_subdomains_score_zero() {
        let h = hit("Jane Fox", "https://mobile.x.com/janefox", "");
        assert_eq!(score_hit(&h, "Jane Fox", "Ohio", PROFILE), 0.0);

        let h = hit("Jane Fox", "https://en.m.wikipedia.org/wiki/Jane_Fox", "");
        assert_eq!(score_hit(&h, "Jane Fox", "Ohio", PROFILE), 0.0);

        let h = hit("Jane Fox", "https://x.com/janefox", "");
        assert_eq!(score_hit(&h, "Jane Fox", "Ohio", PROFILE), 0.0);
    }

    #[test]
    fn test_government_hosts_score_zero() {
        let h = hit("Rep. John Smith", "https://smith.house.gov/", "Official website");
        assert_eq!(score_hit(&h, "John Smith", "Ohio", PROFILE), 0.0);
    }

    #[test]
    fn test_deep_link_scores_lower() {
        let root = hit("Jane Roe", "https://janeroe.com/", "");
        let deep = hit("Jane Roe", "https://janeroe.com/news/2024/endorsement", "");
        let root_score = score_hit(&root, "Jane Roe", "Ohio", PROFILE);
        let deep_score = score_hit(&deep, "Jane Roe", "Ohio", PROFILE);
        assert!((root_score - deep_score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_url_scores_zero() {
        let h = hit("Jane Roe", "not a url", "campaign");
        assert_eq!(score_hit(&h, "Jane Roe", "Ohio", PROFILE), 0.0);
    }

    #[test]
    fn test_surname() {
        assert_eq!(surname("John Smith"), "smith");
        assert_eq!(surname("Nick Begich III"), "begich");
        assert_eq!(surname("Robert Smith Jr."), "smith");
        assert_eq!(surname("Beto O'Rourke"), "orourke");
        assert_eq!(surname("Alexandria Ocasio-Cortez"), "ocasiocortez");
        assert_eq!(surname("Nydia Velázquez"), "velazquez");
        assert_eq!(surname("Cher"), "cher");
    }

    #[test]
    fn test_surname_matches_hyphen_free_domain() {
        let h = hit("Beto for Texas", "https://beto-orourke.com/", "");
        assert!(score_hit(&h, "Beto O'Rourke", "Texas", PROFILE) >= 0.4);
    }
}
