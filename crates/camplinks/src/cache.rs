//! On-disk cache of contact lookups, keyed by candidate identity, so an
//! interrupted search stage resumes where it stopped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Tier 1 profile page URL.
pub const PROFILE_URL_KEY: &str = "_profile_url";
/// Campaign site accepted by the scored web search.
pub const WEB_SEARCH_KEY: &str = "_web_search";

/// Link label (or one of the `_`-prefixed internal keys) to URL.
pub type CacheEntry = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to access cache file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed cache file: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn make_cache_key(party: &str, jurisdiction: &str, district: Option<&str>, name: &str) -> String {
    format!("{}|{}|{}|{}", party, jurisdiction, district.unwrap_or(""), name)
}

/// Lookup results for every candidate searched so far.
///
/// New entries are flushed to disk every `flush_every` insertions; call
/// [`SearchCache::save`] once more when the stage ends. Only one process
/// may use a cache file at a time.
#[derive(Debug)]
pub struct SearchCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    flush_every: usize,
    unsaved: usize,
}

impl SearchCache {
    /// Load the cache at `path`; a missing file is an empty cache.
    pub fn load(path: impl AsRef<Path>, flush_every: usize) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Loaded {} cached lookups from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries,
            flush_every: flush_every.max(1),
            unsaved: 0,
        })
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a new lookup, flushing to disk when enough have accumulated.
    /// Returns whether this call flushed.
    pub fn record(&mut self, key: String, entry: CacheEntry) -> Result<bool, CacheError> {
        self.entries.insert(key, entry);
        self.unsaved += 1;
        if self.unsaved >= self.flush_every {
            self.save()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Write the whole cache through a temporary file and rename it into
    /// place.
    pub fn save(&mut self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        self.unsaved = 0;
        log::debug!("Saved {} cached lookups to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}
