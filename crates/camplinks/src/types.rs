use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// District marker for races elected by the whole state or territory.
pub const AT_LARGE: &str = "At-Large";

#[derive(Debug, thiserror::Error)]
#[error(
    "Invalid link type '{0}'. Accepted values: 'campaign_site', 'campaign_facebook', \
     'campaign_x', 'campaign_instagram', 'personal_website', 'personal_facebook', \
     'personal_linkedin'"
)]
pub struct LinkTypeParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    CampaignSite,
    CampaignFacebook,
    CampaignX,
    CampaignInstagram,
    PersonalWebsite,
    PersonalFacebook,
    PersonalLinkedin,
}

impl LinkType {
    pub const ALL: [LinkType; 7] = [
        LinkType::CampaignSite,
        LinkType::CampaignFacebook,
        LinkType::CampaignX,
        LinkType::CampaignInstagram,
        LinkType::PersonalWebsite,
        LinkType::PersonalFacebook,
        LinkType::PersonalLinkedin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::CampaignSite => "campaign_site",
            LinkType::CampaignFacebook => "campaign_facebook",
            LinkType::CampaignX => "campaign_x",
            LinkType::CampaignInstagram => "campaign_instagram",
            LinkType::PersonalWebsite => "personal_website",
            LinkType::PersonalFacebook => "personal_facebook",
            LinkType::PersonalLinkedin => "personal_linkedin",
        }
    }

    /// Label used for this link in a profile page "Contact" panel.
    pub fn profile_label(&self) -> &'static str {
        match self {
            LinkType::CampaignSite => "campaign website",
            LinkType::CampaignFacebook => "campaign facebook",
            LinkType::CampaignX => "campaign x",
            LinkType::CampaignInstagram => "campaign instagram",
            LinkType::PersonalWebsite => "personal website",
            LinkType::PersonalFacebook => "personal facebook",
            LinkType::PersonalLinkedin => "personal linkedin",
        }
    }

    pub fn from_profile_label(label: &str) -> Option<LinkType> {
        let label = label.trim().to_lowercase();
        LinkType::ALL
            .into_iter()
            .find(|t| t.profile_label() == label)
    }
}

impl FromStr for LinkType {
    type Err = LinkTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LinkTypeParseError(s.to_string()))
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid provenance '{0}'. Accepted values: 'biography', 'profile-page', 'web-search'")]
pub struct ProvenanceParseError(String);

/// Which discovery path produced a contact link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Biography,
    ProfilePage,
    WebSearch,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Biography => "biography",
            Provenance::ProfilePage => "profile-page",
            Provenance::WebSearch => "web-search",
        }
    }
}

impl FromStr for Provenance {
    type Err = ProvenanceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "biography" => Ok(Provenance::Biography),
            "profile-page" => Ok(Provenance::ProfilePage),
            "web-search" => Ok(Provenance::WebSearch),
            _ => Err(ProvenanceParseError(s.to_string())),
        }
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub jurisdiction: String,
    pub race_category: String,
    pub year: u16,
    /// `None` for statewide races.
    pub district: Option<String>,
    pub source_url: String,
}

impl Election {
    pub fn new(
        jurisdiction: impl Into<String>,
        race_category: impl Into<String>,
        year: u16,
        district: Option<String>,
    ) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            race_category: race_category.into(),
            year,
            district,
            source_url: String::new(),
        }
    }
}

impl Display for Election {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.year, self.jurisdiction, self.race_category)?;
        if let Some(district) = &self.district {
            write!(f, " (district {})", district)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub party: String,
    pub name: String,
    pub biography_url: Option<String>,
    pub profile_url: Option<String>,
    pub vote_pct: Option<f64>,
    pub is_winner: bool,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.party.is_empty() {
            write!(f, " ({})", self.party)?;
        }
        if let Some(pct) = self.vote_pct {
            write!(f, " {:.2}%", pct)?;
        }
        if self.is_winner {
            write!(f, " [winner]")?;
        }
        Ok(())
    }
}

/// One candidate row as read from the page, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidate {
    pub party: String,
    pub name: String,
    pub link: String,
    pub vote_pct: Option<f64>,
    pub is_winner: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectionResult {
    pub election: Election,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLink {
    pub candidate_id: i64,
    pub link_type: LinkType,
    pub url: String,
    pub provenance: Provenance,
}

/// A stored candidate together with the election fields needed to look it up.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTarget {
    pub candidate_id: i64,
    pub name: String,
    pub party: String,
    pub biography_url: Option<String>,
    pub profile_url: Option<String>,
    pub jurisdiction: String,
    pub district: Option<String>,
    pub year: u16,
    pub race_category: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub year: u16,
    pub elections: u64,
    pub candidates: u64,
    pub contact_links: u64,
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nSummary for {}:", self.year)?;
        writeln!(f, "  Elections:     {}", self.elections)?;
        writeln!(f, "  Candidates:    {}", self.candidates)?;
        write!(f, "  Contact links: {}", self.contact_links)
    }
}
