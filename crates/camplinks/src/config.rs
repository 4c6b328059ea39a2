use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Tunables for fetching, searching and scoring.
///
/// Every field has a default, so a settings file only needs the values it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub document_delay_ms: u64,
    pub profile_delay_ms: u64,
    pub search_delay_ms: u64,
    pub backoff_base_ms: u64,
    pub max_retries: u32,
    pub profile_domain: String,
    pub profile_max_results: usize,
    pub web_max_results: usize,
    pub accept_threshold: f64,
    pub early_stop_threshold: f64,
    pub cache_save_interval: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: format!(
                "Mozilla/5.0 (compatible; {}/{}; election research)",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            timeout_secs: 30,
            document_delay_ms: 500,
            profile_delay_ms: 1_500,
            search_delay_ms: 3_000,
            backoff_base_ms: 30_000,
            max_retries: 3,
            profile_domain: "ballotpedia.org".to_string(),
            profile_max_results: 5,
            web_max_results: 8,
            accept_threshold: 0.3,
            early_stop_threshold: 0.5,
            cache_save_interval: 25,
        }
    }
}

const MAX_RETRIES_LIMIT: u32 = 10;

impl Settings {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()
    }

    pub fn validate(self) -> Result<Self, SettingsError> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(SettingsError::Invalid(format!(
                "accept_threshold ({}) must be between 0.0 and 1.0",
                self.accept_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.early_stop_threshold) {
            return Err(SettingsError::Invalid(format!(
                "early_stop_threshold ({}) must be between 0.0 and 1.0",
                self.early_stop_threshold
            )));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(SettingsError::Invalid(format!(
                "max_retries ({}) must be at most {}",
                self.max_retries, MAX_RETRIES_LIMIT
            )));
        }
        if self.cache_save_interval == 0 {
            return Err(SettingsError::Invalid(
                "cache_save_interval must be greater than 0".to_string(),
            ));
        }
        if self.profile_domain.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "profile_domain must not be empty".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn document_delay(&self) -> Duration {
        Duration::from_millis(self.document_delay_ms)
    }

    pub fn profile_delay(&self) -> Duration {
        Duration::from_millis(self.profile_delay_ms)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Settings with every delay zeroed, for tests driving fake backends.
    pub fn without_delays() -> Self {
        Self {
            document_delay_ms: 0,
            profile_delay_ms: 0,
            search_delay_ms: 0,
            backoff_base_ms: 0,
            ..Self::default()
        }
    }
}
