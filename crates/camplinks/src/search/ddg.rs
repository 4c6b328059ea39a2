use std::sync::LazyLock;

use reqwest::{Client, StatusCode, Url};
use scraper::{Html, Selector};

use super::{SearchError, SearchHit, SearchService};
use crate::config::Settings;
use crate::parser::{elem_text, normalize_whitespace};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

static SEL_RESULT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.result").expect("invalid selector: div.result"));

static SEL_RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("invalid selector: a.result__a"));

static SEL_SNIPPET: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".result__snippet").expect("invalid selector: .result__snippet")
});

/// Search backend for DuckDuckGo's JavaScript-free HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    client: Client,
    endpoint: String,
}

impl DuckDuckGo {
    pub fn new(settings: &Settings) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: ENDPOINT.to_string(),
        })
    }
}

impl SearchService for DuckDuckGo {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|e| SearchError::Failed(e.to_string()))?;

        log::debug!("Searching: {}", query);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::ACCEPTED {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::Failed(format!("search endpoint returned {}", status)));
        }

        let body = response.text().await?;
        if is_challenge_page(&body) {
            return Err(SearchError::RateLimited);
        }
        Ok(parse_results(&body, max_results))
    }
}

/// The endpoint answers suspected bots with a captcha page instead of an
/// error status.
fn is_challenge_page(body: &str) -> bool {
    body.contains("anomaly-modal") || body.contains("bots use DuckDuckGo too")
}

/// Result links point at a `/l/?uddg=` redirect carrying the target URL.
fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    if url.path().starts_with("/l/") {
        return url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }
    matches!(url.scheme(), "http" | "https").then_some(absolute)
}

pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    document
        .select(&SEL_RESULT)
        .filter(|r| {
            !r.value()
                .attr("class")
                .is_some_and(|c| c.contains("result--ad"))
        })
        .filter_map(|result| {
            let link = result.select(&SEL_RESULT_LINK).next()?;
            let url = unwrap_redirect(link.value().attr("href")?)?;
            let snippet = result
                .select(&SEL_SNIPPET)
                .next()
                .map(|s| normalize_whitespace(&elem_text(s)))
                .unwrap_or_default();
            Some(SearchHit {
                title: normalize_whitespace(&elem_text(link)),
                url,
                snippet,
            })
        })
        .take(max_results)
        .collect()
}
