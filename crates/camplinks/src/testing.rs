//! In-memory stand-ins for the network backends.

use std::cell::RefCell;
use std::collections::HashMap;

use reqwest::StatusCode;

use crate::fetch::{FetchError, Pace, PageSource};
use crate::search::{SearchError, SearchHit, SearchService};

/// Serves canned pages by URL; unknown URLs answer 404.
#[derive(Debug, Default)]
pub(crate) struct FakePages {
    pages: HashMap<String, String>,
    requests: RefCell<Vec<(String, Pace)>>,
}

impl FakePages {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(u, _)| u.clone()).collect()
    }

    pub(crate) fn paces(&self) -> Vec<Pace> {
        self.requests.borrow().iter().map(|(_, p)| *p).collect()
    }
}

impl PageSource for FakePages {
    async fn get_html(&self, url: &str, pace: Pace) -> Result<String, FetchError> {
        self.requests.borrow_mut().push((url.to_string(), pace));
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: StatusCode::NOT_FOUND,
        })
    }
}

#[derive(Debug, Default)]
enum Mode {
    #[default]
    Canned,
    RateLimited,
    Failing,
}

/// Answers each query with the hits of the first registered needle the
/// query contains.
#[derive(Debug, Default)]
pub(crate) struct FakeSearch {
    mode: Mode,
    answers: Vec<(String, Vec<SearchHit>)>,
    queries: RefCell<Vec<String>>,
}

impl FakeSearch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rate_limited() -> Self {
        Self {
            mode: Mode::RateLimited,
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            mode: Mode::Failing,
            ..Self::default()
        }
    }

    pub(crate) fn with_hits(mut self, needle: &str, hits: Vec<SearchHit>) -> Self {
        self.answers.push((needle.to_string(), hits));
        self
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl SearchService for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.borrow_mut().push(query.to_string());
        match self.mode {
            Mode::RateLimited => Err(SearchError::RateLimited),
            Mode::Failing => Err(SearchError::Failed("backend unavailable".to_string())),
            Mode::Canned => Ok(self
                .answers
                .iter()
                .find(|(needle, _)| query.contains(needle.as_str()))
                .map(|(_, hits)| hits.iter().take(max_results).cloned().collect())
                .unwrap_or_default()),
        }
    }
}

pub(crate) fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
    }
}
