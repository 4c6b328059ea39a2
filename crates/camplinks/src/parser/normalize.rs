use crate::types::{Candidate, RawCandidate};

/// Turn raw rows into candidates, dropping rows without a name.
pub fn normalize(raw: Vec<RawCandidate>) -> Vec<Candidate> {
    raw.into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .map(|r| Candidate {
            party: r.party,
            name: r.name,
            biography_url: (!r.link.is_empty()).then_some(r.link),
            profile_url: None,
            vote_pct: r.vote_pct,
            is_winner: r.is_winner,
        })
        .collect()
}
