//! Campaign websites read from the candidates' own biography pages.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::fetch::{Pace, PageSource};
use crate::parser::bio::extract_campaign_site;
use crate::store::{Store, StoreError};
use crate::types::{LinkType, Provenance};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    pub pages: usize,
    pub found: usize,
    pub failed: usize,
}

/// Fetch the biography page of every candidate still missing a campaign
/// website and record the site it links to. Candidates sharing a biography
/// page are served by a single fetch.
pub async fn enrich_stage<P: PageSource>(
    store: &Store,
    pages: &P,
    year: Option<u16>,
    race_categories: &[&str],
) -> Result<EnrichStats, StoreError> {
    let mut by_url: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for target in store.candidates_missing_link(LinkType::CampaignSite, year, race_categories)? {
        if let Some(url) = target.biography_url {
            by_url.entry(url).or_default().push(target.candidate_id);
        }
    }
    log::info!("Enriching {} biography pages", by_url.len());

    let mut stats = EnrichStats::default();
    for (url, candidate_ids) in by_url {
        stats.pages += 1;
        let html = match pages.get_html(&url, Pace::Document).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to fetch biography {}: {}", url, e);
                stats.failed += 1;
                continue;
            }
        };

        let site = extract_campaign_site(&html);
        if site.is_empty() {
            log::debug!("No campaign site on {}", url);
            continue;
        }
        for candidate_id in candidate_ids {
            store.upsert_contact_link(candidate_id, LinkType::CampaignSite, &site, Provenance::Biography)?;
            stats.found += 1;
        }
    }

    log::info!(
        "Found campaign sites for {} candidates ({} pages, {} failed)",
        stats.found,
        stats.pages,
        stats.failed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePages;
    use crate::types::{Candidate, Election};

    const BIO: &str = "https://en.wikipedia.org/wiki/Jane_Doe";
    const MISSING: &str = "https://en.wikipedia.org/wiki/Gone";

    fn candidate(name: &str, bio: Option<&str>) -> Candidate {
        Candidate {
            party: "Democratic".to_string(),
            name: name.to_string(),
            biography_url: bio.map(str::to_string),
            profile_url: None,
            vote_pct: None,
            is_winner: false,
        }
    }

    #[tokio::test]
    async fn test_each_biography_fetched_once() {
        let store = Store::open_in_memory().unwrap();
        let house = store
            .upsert_election(&Election::new("Ohio", "US House", 2024, Some("1".to_string())))
            .unwrap();
        let senate = store
            .upsert_election(&Election::new("Ohio", "US Senate", 2024, None))
            .unwrap();

        let in_house = store.upsert_candidate(house, &candidate("Jane Doe", Some(BIO))).unwrap();
        let in_senate = store.upsert_candidate(senate, &candidate("Jane Doe", Some(BIO))).unwrap();
        store.upsert_candidate(house, &candidate("No Page", None)).unwrap();
        store.upsert_candidate(house, &candidate("Red Link", Some(MISSING))).unwrap();

        let html = r#"<table class="infobox"><tr><th class="infobox-label">Website</th>
            <td class="infobox-data"><a class="external" href="https://janedoe.com/">Campaign website</a></td>
            </tr></table>"#;
        let pages = FakePages::new().with_page(BIO, html);

        let stats = enrich_stage(&store, &pages, Some(2024), &[]).await.unwrap();

        assert_eq!(stats, EnrichStats { pages: 2, found: 2, failed: 1 });
        assert_eq!(pages.requested().iter().filter(|u| *u == BIO).count(), 1);
        assert_eq!(pages.paces(), [Pace::Document, Pace::Document]);
        for id in [in_house, in_senate] {
            let links = store.contact_links_for(id).unwrap();
            assert_eq!(links[0].url, "https://janedoe.com/");
            assert_eq!(links[0].provenance, Provenance::Biography);
        }
    }
}
