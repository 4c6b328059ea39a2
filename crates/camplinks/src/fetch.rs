use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::config::Settings;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
}

/// Which politeness delay applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Document,
    Profile,
}

#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetch `url` after the delay for `pace` and return the response body.
    async fn get_html(&self, url: &str, pace: Pace) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: Client,
    document_delay: Duration,
    profile_delay: Duration,
}

impl WebFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            document_delay: settings.document_delay(),
            profile_delay: settings.profile_delay(),
        })
    }
}

impl PageSource for WebFetcher {
    async fn get_html(&self, url: &str, pace: Pace) -> Result<String, FetchError> {
        let delay = match pace {
            Pace::Document => self.document_delay,
            Pace::Profile => self.profile_delay,
        };
        tokio::time::sleep(delay).await;

        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}
