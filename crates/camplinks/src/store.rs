//! SQLite persistence for elections, candidates and contact links.
//!
//! Every write is an upsert on the entity's natural key, so re-running a
//! scrape converges on the same rows.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::types::{
    Candidate, CandidateTarget, ContactLink, Election, ElectionResult, LinkType, Provenance,
    Summary,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS elections (
    election_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    jurisdiction  TEXT    NOT NULL,
    race_type     TEXT    NOT NULL,
    year          INTEGER NOT NULL,
    district      TEXT    NOT NULL DEFAULT '',
    source_url    TEXT    NOT NULL DEFAULT '',
    UNIQUE (jurisdiction, race_type, year, district)
);

CREATE TABLE IF NOT EXISTS candidates (
    candidate_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    election_id   INTEGER NOT NULL REFERENCES elections (election_id),
    party         TEXT    NOT NULL DEFAULT '',
    name          TEXT    NOT NULL,
    biography_url TEXT    NOT NULL DEFAULT '',
    profile_url   TEXT    NOT NULL DEFAULT '',
    vote_pct      REAL,
    is_winner     INTEGER NOT NULL DEFAULT 0,
    UNIQUE (election_id, name)
);

CREATE TABLE IF NOT EXISTS contact_links (
    link_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    candidate_id  INTEGER NOT NULL REFERENCES candidates (candidate_id),
    link_type     TEXT    NOT NULL,
    url           TEXT    NOT NULL,
    source        TEXT    NOT NULL,
    UNIQUE (candidate_id, link_type)
);

CREATE INDEX IF NOT EXISTS idx_candidates_election ON candidates (election_id);
CREATE INDEX IF NOT EXISTS idx_contact_links_candidate ON contact_links (candidate_id);
CREATE INDEX IF NOT EXISTS idx_elections_year_race ON elections (year, race_type);
";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Row counts of the three tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub elections: u64,
    pub candidates: u64,
    pub contact_links: u64,
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        // in-memory databases answer "memory" instead of switching to WAL
        let _mode: String = self
            .conn
            .query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert an election or return the existing row. The source URL is
    /// only filled in when the stored one is empty.
    pub fn upsert_election(&self, election: &Election) -> Result<i64, StoreError> {
        let id = self.conn.query_row(
            "INSERT INTO elections (jurisdiction, race_type, year, district, source_url)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (jurisdiction, race_type, year, district) DO UPDATE SET
                 source_url = CASE WHEN elections.source_url = ''
                                   THEN excluded.source_url
                                   ELSE elections.source_url END
             RETURNING election_id",
            params![
                election.jurisdiction,
                election.race_category,
                election.year,
                election.district.as_deref().unwrap_or(""),
                election.source_url,
            ],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// Insert a candidate or merge it into the existing row: URLs are kept
    /// unless the new value is non-empty, the vote share unless a new one is
    /// present, and the winner flag is sticky.
    pub fn upsert_candidate(&self, election_id: i64, candidate: &Candidate) -> Result<i64, StoreError> {
        let id = self.conn.query_row(
            "INSERT INTO candidates
                 (election_id, party, name, biography_url, profile_url, vote_pct, is_winner)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (election_id, name) DO UPDATE SET
                 party         = COALESCE(NULLIF(excluded.party, ''), candidates.party),
                 biography_url = COALESCE(NULLIF(excluded.biography_url, ''), candidates.biography_url),
                 profile_url   = COALESCE(NULLIF(excluded.profile_url, ''), candidates.profile_url),
                 vote_pct      = COALESCE(excluded.vote_pct, candidates.vote_pct),
                 is_winner     = MAX(candidates.is_winner, excluded.is_winner)
             RETURNING candidate_id",
            params![
                election_id,
                candidate.party,
                candidate.name,
                candidate.biography_url.as_deref().unwrap_or(""),
                candidate.profile_url.as_deref().unwrap_or(""),
                candidate.vote_pct,
                candidate.is_winner,
            ],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// Record a contact link; a later discovery of the same category
    /// replaces the URL and provenance.
    pub fn upsert_contact_link(
        &self,
        candidate_id: i64,
        link_type: LinkType,
        url: &str,
        provenance: Provenance,
    ) -> Result<i64, StoreError> {
        let id = self.conn.query_row(
            "INSERT INTO contact_links (candidate_id, link_type, url, source)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (candidate_id, link_type) DO UPDATE SET
                 url = excluded.url,
                 source = excluded.source
             RETURNING link_id",
            params![candidate_id, link_type.as_str(), url, provenance.as_str()],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn set_profile_url(&self, candidate_id: i64, url: &str) -> Result<(), StoreError> {
        if url.is_empty() {
            return Ok(());
        }
        self.conn.execute(
            "UPDATE candidates SET profile_url = ?2 WHERE candidate_id = ?1",
            params![candidate_id, url],
        )?;
        Ok(())
    }

    /// Candidates with no contact link of `link_type`, optionally limited to
    /// one year and to the given race categories (empty means all).
    pub fn candidates_missing_link(
        &self,
        link_type: LinkType,
        year: Option<u16>,
        race_categories: &[&str],
    ) -> Result<Vec<CandidateTarget>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.candidate_id, c.name, c.party, c.biography_url, c.profile_url,
                    e.jurisdiction, e.district, e.year, e.race_type
             FROM candidates c
             JOIN elections e ON e.election_id = c.election_id
             WHERE NOT EXISTS (
                 SELECT 1 FROM contact_links l
                 WHERE l.candidate_id = c.candidate_id AND l.link_type = ?1
             )
             AND c.name != ''
             AND (?2 IS NULL OR e.year = ?2)
             ORDER BY c.candidate_id",
        )?;

        let rows = stmt.query_map(params![link_type.as_str(), year], |r| {
            Ok(CandidateTarget {
                candidate_id: r.get(0)?,
                name: r.get(1)?,
                party: r.get(2)?,
                biography_url: non_empty(r.get(3)?),
                profile_url: non_empty(r.get(4)?),
                jurisdiction: r.get(5)?,
                district: non_empty(r.get(6)?),
                year: r.get(7)?,
                race_category: r.get(8)?,
            })
        })?;

        let mut targets = Vec::new();
        for row in rows {
            let target = row?;
            if race_categories.is_empty()
                || race_categories.contains(&target.race_category.as_str())
            {
                targets.push(target);
            }
        }
        Ok(targets)
    }

    /// Write every election and candidate parsed from one detail page in a
    /// single transaction. Returns the number of candidate rows written.
    pub fn write_results(
        &self,
        source_url: &str,
        results: &[ElectionResult],
    ) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        for result in results {
            let election = Election {
                source_url: source_url.to_string(),
                ..result.election.clone()
            };
            let election_id = self.upsert_election(&election)?;
            for candidate in &result.candidates {
                self.upsert_candidate(election_id, candidate)?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    pub fn candidates_for_election(&self, election_id: i64) -> Result<Vec<Candidate>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT party, name, biography_url, profile_url, vote_pct, is_winner
             FROM candidates WHERE election_id = ?1 ORDER BY candidate_id",
        )?;
        let rows = stmt.query_map(params![election_id], |r| {
            Ok(Candidate {
                party: r.get(0)?,
                name: r.get(1)?,
                biography_url: non_empty(r.get(2)?),
                profile_url: non_empty(r.get(3)?),
                vote_pct: r.get(4)?,
                is_winner: r.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn election_source_url(&self, election_id: i64) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT source_url FROM elections WHERE election_id = ?1",
                params![election_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    pub fn contact_links_for(&self, candidate_id: i64) -> Result<Vec<ContactLink>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT link_type, url, source FROM contact_links
             WHERE candidate_id = ?1 ORDER BY link_id",
        )?;
        let rows = stmt.query_map(params![candidate_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;

        let mut links = Vec::new();
        for row in rows {
            let (link_type, url, source) = row?;
            links.push(ContactLink {
                candidate_id,
                link_type: link_type
                    .parse::<LinkType>()
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                url,
                provenance: source
                    .parse::<Provenance>()
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            });
        }
        Ok(links)
    }

    /// Totals for one election year.
    pub fn summary(&self, year: u16) -> Result<Summary, StoreError> {
        let elections: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM elections WHERE year = ?1",
            params![year],
            |r| r.get(0),
        )?;
        let candidates: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM candidates c
             JOIN elections e ON e.election_id = c.election_id
             WHERE e.year = ?1",
            params![year],
            |r| r.get(0),
        )?;
        let contact_links: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM contact_links l
             JOIN candidates c ON c.candidate_id = l.candidate_id
             JOIN elections e ON e.election_id = c.election_id
             WHERE e.year = ?1",
            params![year],
            |r| r.get(0),
        )?;
        Ok(Summary {
            year,
            elections: elections as u64,
            candidates: candidates as u64,
            contact_links: contact_links as u64,
        })
    }

    pub fn counts(&self) -> Result<TableCounts, StoreError> {
        let count = |table: &str| -> Result<u64, StoreError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as u64)
        };
        Ok(TableCounts {
            elections: count("elections")?,
            candidates: count("candidates")?,
            contact_links: count("contact_links")?,
        })
    }
}
