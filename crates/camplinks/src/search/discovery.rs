//! Tiered contact discovery for one candidate at a time.
//!
//! Tier 1 finds the candidate's profile page through a site-restricted
//! search and harvests its contact panel. Tier 2 runs only when tier 1
//! produced no campaign website: open web queries whose hits are scored,
//! keeping the best one above the acceptance threshold.

use serde::Serialize;

use super::score::score_hit;
use super::{SearchService, search_with_backoff};
use crate::cache::{CacheEntry, PROFILE_URL_KEY, WEB_SEARCH_KEY};
use crate::config::Settings;
use crate::fetch::{Pace, PageSource};
use crate::parser::profile::{extract_contact_links, is_profile_item_url};
use crate::store::{Store, StoreError};
use crate::types::{CandidateTarget, LinkType, Provenance};

/// Outcome counts of a search stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub targets: usize,
    pub cache_hits: usize,
    pub searched: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Word used in queries to name the office being contested.
pub fn race_keyword(race_category: &str) -> &'static str {
    match race_category {
        "US House" => "congress",
        "US Senate" => "senate",
        "Governor" => "governor",
        "Attorney General" => "attorney general",
        "Mayor" => "mayor",
        "State Supreme Court" => "supreme court",
        _ => "election",
    }
}

pub struct Discovery<'a, P, S> {
    pages: &'a P,
    search: &'a S,
    settings: &'a Settings,
}

impl<'a, P: PageSource, S: SearchService> Discovery<'a, P, S> {
    pub fn new(pages: &'a P, search: &'a S, settings: &'a Settings) -> Self {
        Self {
            pages,
            search,
            settings,
        }
    }

    /// Run both tiers for `target`. The returned entry is what gets cached,
    /// including an empty one when nothing was found.
    pub async fn lookup(&self, target: &CandidateTarget) -> CacheEntry {
        let keyword = race_keyword(&target.race_category);
        let mut entry = self.profile_lookup(target, keyword).await;

        if !entry.contains_key(LinkType::CampaignSite.profile_label()) {
            if let Some(url) = self.web_lookup(target, keyword).await {
                entry.insert(WEB_SEARCH_KEY.to_string(), url);
            }
        }
        entry
    }

    async fn profile_lookup(&self, target: &CandidateTarget, keyword: &str) -> CacheEntry {
        let domain = &self.settings.profile_domain;
        let query = format!(
            "site:{} \"{}\" {} {} {}",
            domain, target.name, target.jurisdiction, keyword, target.year
        );
        let hits = search_with_backoff(
            self.search,
            &query,
            self.settings.profile_max_results,
            self.settings,
        )
        .await;

        let mut entry = CacheEntry::new();
        let Some(profile_url) = hits
            .into_iter()
            .map(|h| h.url)
            .find(|url| is_profile_item_url(url, domain))
        else {
            log::debug!("No profile page found for {}", target.name);
            return entry;
        };

        match self.pages.get_html(&profile_url, Pace::Profile).await {
            Ok(html) => {
                entry.extend(extract_contact_links(&html));
                entry.insert(PROFILE_URL_KEY.to_string(), profile_url);
            }
            Err(e) => log::error!("Profile fetch failed for {}: {}", target.name, e),
        }
        entry
    }

    async fn web_lookup(&self, target: &CandidateTarget, keyword: &str) -> Option<String> {
        let queries = [
            format!(
                "\"{}\" {} {} {} campaign official website",
                target.name, target.jurisdiction, target.year, keyword
            ),
            format!(
                "\"{}\" for {} {} {}",
                target.name, keyword, target.year, target.jurisdiction
            ),
        ];

        let mut best: Option<(f64, String)> = None;
        for query in &queries {
            let hits =
                search_with_backoff(self.search, query, self.settings.web_max_results, self.settings)
                    .await;
            for hit in &hits {
                let score = score_hit(
                    hit,
                    &target.name,
                    &target.jurisdiction,
                    &self.settings.profile_domain,
                );
                if best.as_ref().is_none_or(|(b, _)| score > *b) && score > 0.0 {
                    best = Some((score, hit.url.clone()));
                }
            }
            if best
                .as_ref()
                .is_some_and(|(b, _)| *b >= self.settings.early_stop_threshold)
            {
                break;
            }
        }

        let (score, url) = best?;
        log::debug!("Best web hit for {}: {} ({:.2})", target.name, url, score);
        (score >= self.settings.accept_threshold).then_some(url)
    }
}

/// Write a lookup result to the store. Returns whether it yielded a
/// campaign website.
pub fn apply_entry(
    store: &Store,
    candidate_id: i64,
    entry: &CacheEntry,
) -> Result<bool, StoreError> {
    let mut has_site = false;
    for (label, url) in entry {
        if url.is_empty() {
            continue;
        }
        match label.as_str() {
            PROFILE_URL_KEY => store.set_profile_url(candidate_id, url)?,
            WEB_SEARCH_KEY => {
                store.upsert_contact_link(candidate_id, LinkType::CampaignSite, url, Provenance::WebSearch)?;
                has_site = true;
            }
            _ => match LinkType::from_profile_label(label) {
                Some(link_type) => {
                    store.upsert_contact_link(candidate_id, link_type, url, Provenance::ProfilePage)?;
                    has_site |= link_type == LinkType::CampaignSite;
                }
                None => log::debug!("Ignoring contact label '{}'", label),
            },
        }
    }
    Ok(has_site)
}
