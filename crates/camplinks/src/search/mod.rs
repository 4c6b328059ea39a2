//! Web search: the backend trait, a DuckDuckGo backend, result scoring and
//! the tiered contact discovery built on top of them.

pub mod ddg;
pub mod discovery;
pub mod score;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Settings;

pub use ddg::DuckDuckGo;
pub use discovery::{Discovery, SearchStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search backend rate limited the request")]
    RateLimited,
    #[error("Search failed: {0}")]
    Failed(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[allow(async_fn_in_trait)]
pub trait SearchService {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Run `query`, waiting the search delay before every attempt and backing
/// off exponentially while the backend rate limits. Exhausted retries and
/// any other failure yield no hits.
pub async fn search_with_backoff<S: SearchService>(
    service: &S,
    query: &str,
    max_results: usize,
    settings: &Settings,
) -> Vec<SearchHit> {
    for attempt in 0..=settings.max_retries {
        tokio::time::sleep(settings.search_delay()).await;
        match service.search(query, max_results).await {
            Ok(hits) => return hits,
            Err(SearchError::RateLimited) if attempt < settings.max_retries => {
                let wait = backoff_delay(settings.backoff_base(), attempt);
                log::info!(
                    "Search rate limited, waiting {:.0}s (attempt {}/{})",
                    wait.as_secs_f64(),
                    attempt + 1,
                    settings.max_retries
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                log::error!("Search failed after {} attempt(s): {}", attempt + 1, e);
                return Vec::new();
            }
        }
    }
    Vec::new()
}

/// `base * 2^attempt`, saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSearch;

    #[tokio::test]
    async fn test_backoff_retries_up_to_ceiling() {
        let service = FakeSearch::rate_limited();
        let settings = Settings::without_delays();

        let hits = search_with_backoff(&service, "\"Jane Doe\" Ohio", 8, &settings).await;

        assert!(hits.is_empty());
        assert_eq!(service.queries().len(), settings.max_retries as usize + 1);
    }

    #[tokio::test]
    async fn test_backoff_returns_first_success() {
        let service = FakeSearch::new().with_hits(
            "Jane Doe",
            vec![SearchHit {
                title: "Jane Doe for Congress".to_string(),
                url: "https://janedoe.com/".to_string(),
                snippet: String::new(),
            }],
        );
        let settings = Settings::without_delays();

        let hits = search_with_backoff(&service, "\"Jane Doe\" Ohio", 8, &settings).await;

        assert_eq!(hits.len(), 1);
        assert_eq!(service.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let service = FakeSearch::failing();
        let settings = Settings::without_delays();

        assert!(search_with_backoff(&service, "q", 5, &settings).await.is_empty());
        assert_eq!(service.queries().len(), 1);
    }

    #[test]
    fn test_backoff_delay_doubles_and_saturates() {
        let base = Duration::from_secs(10);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(80));
        assert!(backoff_delay(base, 40) >= backoff_delay(base, 31));
        assert_eq!(backoff_delay(Duration::MAX, 2), Duration::MAX);
        assert_eq!(backoff_delay(Duration::ZERO, 64), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_backoff_survives_large_retry_ceiling() {
        let service = FakeSearch::rate_limited();
        let settings = Settings {
            max_retries: 40,
            ..Settings::without_delays()
        };

        assert!(search_with_backoff(&service, "q", 5, &settings).await.is_empty());
        assert_eq!(service.queries().len(), 41);
    }
}
