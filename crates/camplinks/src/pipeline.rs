//! Stage orchestration: scrape results into the store, enrich candidates
//! from their biography pages, then search for the remaining contacts.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::{CacheError, SearchCache, make_cache_key};
use crate::config::Settings;
use crate::enrich::enrich_stage;
use crate::families::{DetailPage, RaceFamily, Registry, UnknownFamily};
use crate::fetch::{FetchError, Pace, PageSource};
use crate::parser::ParseError;
use crate::search::discovery::apply_entry;
use crate::search::{Discovery, SearchService, SearchStats};
use crate::store::{Store, StoreError};
use crate::types::{ElectionResult, LinkType, Summary};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnknownFamily(#[from] UnknownFamily),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid stage '{0}'. Accepted values: 'scrape', 'enrich', 'search'")]
pub struct StageParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scrape,
    Enrich,
    Search,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Scrape, Stage::Enrich, Stage::Search];
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scrape" => Ok(Stage::Scrape),
            "enrich" => Ok(Stage::Enrich),
            "search" => Ok(Stage::Search),
            _ => Err(StageParseError(s.to_string())),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Scrape => "scrape",
            Stage::Enrich => "enrich",
            Stage::Search => "search",
        };
        write!(f, "{}", name)
    }
}

/// What became of one detail page.
#[derive(Debug)]
pub enum PageOutcome {
    Parsed(Vec<ElectionResult>),
    TransportFailure(FetchError),
    ParseFailure(ParseError),
}

pub struct Pipeline<P, S> {
    store: Store,
    registry: Registry,
    pages: P,
    search: S,
    settings: Settings,
    cache_path: PathBuf,
}

impl<P: PageSource, S: SearchService> Pipeline<P, S> {
    pub fn new(
        store: Store,
        registry: Registry,
        pages: P,
        search: S,
        settings: Settings,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            registry,
            pages,
            search,
            settings,
            cache_path: cache_path.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run `stage` (or every stage in order) for the families selected by
    /// `race` and return the totals for `year`.
    pub async fn run(
        &self,
        year: u16,
        race: &str,
        stage: Option<Stage>,
    ) -> Result<Summary, PipelineError> {
        let families: Vec<RaceFamily> = self.registry.select(race)?.into_iter().copied().collect();
        let categories: Vec<&str> = if race == "all" {
            Vec::new()
        } else {
            families
                .iter()
                .flat_map(|f| f.race_categories.iter().copied())
                .collect()
        };
        let stages = stage.map(|s| vec![s]).unwrap_or_else(|| Stage::ALL.to_vec());

        for stage in stages {
            log::info!("Running {} stage for {} ({})", stage, race, year);
            match stage {
                Stage::Scrape => {
                    for family in &families {
                        self.scrape_family(family, year).await?;
                    }
                }
                Stage::Enrich => {
                    enrich_stage(&self.store, &self.pages, Some(year), &categories).await?;
                }
                Stage::Search => {
                    self.search_stage(year, &categories).await?;
                }
            }
        }

        let summary = self.store.summary(year)?;
        log::info!("{}", summary);
        Ok(summary)
    }

    async fn fetch_index(&self, family: &RaceFamily, year: u16) -> Result<String, FetchError> {
        let url = (family.index_locator)(year);
        match self.pages.get_html(&url, Pace::Document).await {
            Ok(html) => Ok(html),
            Err(e) => {
                let Some(fallback) = family.fallback_index_locator else {
                    return Err(e);
                };
                log::warn!("Index {} unavailable ({}), trying fallback", url, e);
                self.pages.get_html(&fallback(year), Pace::Document).await
            }
        }
    }

    async fn process_page(&self, family: &RaceFamily, page: &DetailPage, year: u16) -> PageOutcome {
        let html = match self.pages.get_html(&page.url, Pace::Document).await {
            Ok(html) => html,
            Err(e) => return PageOutcome::TransportFailure(e),
        };
        match (family.parse_detail_page)(&page.label, &html, year) {
            Ok(results) => PageOutcome::Parsed(results),
            Err(e) => PageOutcome::ParseFailure(e),
        }
    }

    /// Returns the number of candidate rows written.
    pub async fn scrape_family(&self, family: &RaceFamily, year: u16) -> Result<usize, PipelineError> {
        let index_html = match self.fetch_index(family, year).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to fetch {} index for {}: {}", family.key, year, e);
                return Ok(0);
            }
        };

        let pages = (family.list_detail_pages)(&index_html, year);
        log::info!("{}: {} detail pages", family.key, pages.len());

        let mut written = 0;
        for page in &pages {
            match self.process_page(family, page, year).await {
                PageOutcome::Parsed(results) if results.is_empty() => {
                    log::warn!("No results found on {} ({})", page.label, page.url);
                }
                PageOutcome::Parsed(results) => {
                    let n = self.store.write_results(&page.url, &results)?;
                    log::debug!("{}: {} elections, {} candidates", page.label, results.len(), n);
                    written += n;
                }
                PageOutcome::TransportFailure(e) => {
                    log::error!("Failed to fetch {}: {}", page.url, e);
                }
                PageOutcome::ParseFailure(e) => {
                    log::warn!("Failed to parse {}: {}", page.url, e);
                }
            }
        }

        log::info!("{}: wrote {} candidates", family.key, written);
        Ok(written)
    }

    pub async fn search_stage(
        &self,
        year: u16,
        race_categories: &[&str],
    ) -> Result<SearchStats, PipelineError> {
        let targets =
            self.store
                .candidates_missing_link(LinkType::CampaignSite, Some(year), race_categories)?;
        let mut stats = SearchStats {
            targets: targets.len(),
            ..SearchStats::default()
        };
        if targets.is_empty() {
            log::info!("No candidates need contact search");
            return Ok(stats);
        }
        log::info!("Searching contacts for {} candidates", targets.len());

        let mut cache = SearchCache::load(&self.cache_path, self.settings.cache_save_interval)?;
        let discovery = Discovery::new(&self.pages, &self.search, &self.settings);

        for target in &targets {
            let key = make_cache_key(
                &target.party,
                &target.jurisdiction,
                target.district.as_deref(),
                &target.name,
            );
            let entry = match cache.get(&key) {
                Some(entry) => {
                    stats.cache_hits += 1;
                    entry.clone()
                }
                None => {
                    let entry = discovery.lookup(target).await;
                    stats.searched += 1;
                    cache.record(key, entry.clone())?;
                    entry
                }
            };

            if apply_entry(&self.store, target.candidate_id, &entry)? {
                stats.resolved += 1;
            } else {
                stats.unresolved += 1;
            }
        }
        cache.save()?;

        log::info!(
            "Resolved {} / {} candidates ({} searched, {} from cache)",
            stats.resolved,
            stats.targets,
            stats.searched,
            stats.cache_hits
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::{governor, senate};
    use crate::families::test_support::{fixture, index_html};
    use crate::store::TableCounts;
    use crate::testing::{FakePages, FakeSearch, hit};
    use crate::types::Election;

    const OHIO: &str = "https://en.wikipedia.org/wiki/2024_United_States_Senate_election_in_Ohio";
    const MONTANA: &str = "https://en.wikipedia.org/wiki/2024_United_States_Senate_election_in_Montana";

    fn senate_pages() -> FakePages {
        FakePages::new()
            .with_page(
                &(senate::FAMILY.index_locator)(2024),
                index_html(&[
                    "/wiki/2024_United_States_Senate_election_in_Ohio",
                    "/wiki/2024_United_States_Senate_election_in_Montana",
                ]),
            )
            .with_page(OHIO, fixture("senate_state.html"))
    }

    fn pipeline(pages: FakePages, search: FakeSearch, cache: PathBuf) -> Pipeline<FakePages, FakeSearch> {
        Pipeline::new(
            Store::open_in_memory().unwrap(),
            Registry::new(),
            pages,
            search,
            Settings::without_delays(),
            cache,
        )
    }

    #[test]
    fn test_stage_from_str() {
        assert_eq!("scrape".parse::<Stage>().unwrap(), Stage::Scrape);
        assert_eq!("Search".parse::<Stage>().unwrap(), Stage::Search);
        assert!("publish".parse::<Stage>().is_err());
    }

    #[tokio::test]
    async fn test_scrape_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(senate_pages(), FakeSearch::new(), dir.path().join("cache.json"));

        let summary = pipeline.run(2024, "senate", Some(Stage::Scrape)).await.unwrap();
        assert_eq!(summary.elections, 1);
        assert_eq!(summary.candidates, 3);
        assert_eq!(summary.contact_links, 0);

        let first = pipeline.store().counts().unwrap();
        pipeline.run(2024, "senate", Some(Stage::Scrape)).await.unwrap();
        assert_eq!(pipeline.store().counts().unwrap(), first);
        assert_eq!(
            first,
            TableCounts {
                elections: 1,
                candidates: 3,
                contact_links: 0
            }
        );
    }

    #[tokio::test]
    async fn test_scrape_skips_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(FakePages::new(), FakeSearch::new(), dir.path().join("cache.json"));

        let summary = pipeline.run(2024, "governor", Some(Stage::Scrape)).await.unwrap();
        assert_eq!(summary.elections, 0);
    }

    #[tokio::test]
    async fn test_attorney_general_falls_back_to_gubernatorial_index() {
        let dir = tempfile::tempdir().unwrap();
        let pages = FakePages::new().with_page(
            &governor::index_locator(2024),
            index_html(&["/wiki/2024_Utah_Attorney_General_election"]),
        );
        let pipeline = pipeline(pages, FakeSearch::new(), dir.path().join("cache.json"));

        pipeline.run(2024, "attorney_general", Some(Stage::Scrape)).await.unwrap();

        let requested = pipeline.pages.requested();
        assert_eq!(requested.len(), 3);
        assert_eq!(requested[1], governor::index_locator(2024));
        assert_eq!(
            requested[2],
            "https://en.wikipedia.org/wiki/2024_Utah_Attorney_General_election"
        );
    }

    #[tokio::test]
    async fn test_unknown_race_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(FakePages::new(), FakeSearch::new(), dir.path().join("cache.json"));

        let result = pipeline.run(2024, "dogcatcher", None).await;
        assert!(matches!(result, Err(PipelineError::UnknownFamily(_))));
    }

    #[tokio::test]
    async fn test_search_stage_uses_cache_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        let search = FakeSearch::new().with_hits(
            "\"Bernie Moreno\" for senate",
            vec![hit("Bernie Moreno for Senate", "https://berniemoreno.com/", "Official campaign")],
        );
        let pipeline = pipeline(senate_pages(), search, cache_path.clone());

        pipeline.run(2024, "senate", Some(Stage::Scrape)).await.unwrap();
        let stats = pipeline.search_stage(2024, &["US Senate"]).await.unwrap();

        assert_eq!(stats.targets, 3);
        assert_eq!(stats.searched, 3);
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.unresolved, 2);
        assert!(cache_path.exists());

        let searches = pipeline.search.queries().len();
        let stats = pipeline.search_stage(2024, &["US Senate"]).await.unwrap();
        assert_eq!(stats.targets, 2);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.searched, 0);
        assert_eq!(pipeline.search.queries().len(), searches);

        let summary = pipeline.store().summary(2024).unwrap();
        assert_eq!(summary.contact_links, 1);
    }

    #[tokio::test]
    async fn test_full_run_for_one_family() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(senate_pages(), FakeSearch::new(), dir.path().join("cache.json"));

        let summary = pipeline.run(2024, "senate", None).await.unwrap();

        assert_eq!(summary.elections, 1);
        assert_eq!(summary.candidates, 3);
        assert!(pipeline.pages.requested().contains(&MONTANA.to_string()));
    }

    #[tokio::test]
    async fn test_two_candidate_race_end_to_end() {
        let page = r#"<html><body><div class="mw-parser-output">
            <div class="mw-heading mw-heading3"><h3 id="General_election">General election</h3></div>
            <table class="wikitable plainrowheaders">
              <caption>2024 United States Senate election in Ohio</caption>
              <tr class="vcard">
                <td></td>
                <td class="org">Republican</td>
                <th class="fn" scope="row"><b>Alice Adams</b></th>
                <td><b>1,200</b></td><td><b>60.0%</b></td>
              </tr>
              <tr class="vcard">
                <td></td>
                <td class="org">Democratic</td>
                <th class="fn" scope="row">Bob Brown</th>
                <td>800</td><td>40.0%</td>
              </tr>
            </table>
            </div></body></html>"#;
        let pages = FakePages::new()
            .with_page(
                &(senate::FAMILY.index_locator)(2024),
                index_html(&["/wiki/2024_United_States_Senate_election_in_Ohio"]),
            )
            .with_page(OHIO, page);
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(pages, FakeSearch::new(), dir.path().join("cache.json"));

        let summary = pipeline.run(2024, "senate", None).await.unwrap();

        assert_eq!(summary.elections, 1);
        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.contact_links, 0);

        let election_id = pipeline
            .store()
            .upsert_election(&Election::new("Ohio", "US Senate", 2024, None))
            .unwrap();
        let candidates = pipeline.store().candidates_for_election(election_id).unwrap();
        let winners: Vec<_> = candidates
            .iter()
            .filter(|c| c.is_winner)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(candidates.len(), 2);
        assert_eq!(winners, ["Alice Adams"]);
        assert_eq!(candidates[1].vote_pct, Some(40.0));
    }
}
