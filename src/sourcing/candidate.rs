//! Candidate data model and search criteria.

use serde::{Deserialize, Serialize};

/// A candidate profile as it moves through the sourcing pipeline.
///
/// Connectors fill the base fields; the collector populates `sources_found`,
/// the validator the verification fields, and the ranker the match fields.
///
/// # Invariants
/// - `id` is unique within one collection result (duplicates are merged)
/// - `sources_found` is non-empty after collection, with set semantics
/// - `cross_source_score` and `match_score` stay within [0, 100]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: f32,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Source that first returned this candidate
    #[serde(default)]
    pub source: String,
    /// Every source that returned this identity (set semantics)
    #[serde(default)]
    pub sources_found: Vec<String>,
    /// Cross-source verification confidence, 0-100
    #[serde(default)]
    pub cross_source_score: u32,
    #[serde(default)]
    pub verification: VerificationStatus,
    #[serde(default)]
    pub consistency: ConsistencyReport,
    /// Explainable match score, 0-100
    #[serde(default)]
    pub match_score: u32,
    #[serde(default)]
    pub match_details: MatchDetails,
}

impl Candidate {
    /// Create a candidate with the base profile fields (test and connector helper).
    pub fn profile(id: &str, name: &str, skills: &[&str], experience_years: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years,
            education: None,
            email: None,
            phone: None,
            source: String::new(),
            sources_found: Vec::new(),
            cross_source_score: 0,
            verification: VerificationStatus::Unverified,
            consistency: ConsistencyReport::default(),
            match_score: 0,
            match_details: MatchDetails::default(),
        }
    }

    /// Whether this identity was corroborated by more than one source.
    pub fn is_cross_source(&self) -> bool {
        self.sources_found.len() >= 2
    }
}

/// Verification outcome from cross-source validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    #[default]
    Unverified,
}

/// Field-agreement report across the raw records of one identity.
///
/// `score` is only meaningful when `cross_checked` is true; single-source
/// candidates carry a neutral zero record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub cross_checked: bool,
    /// Agreement ratio across checked fields, 0-100
    pub score: u32,
}

/// Explainable skill breakdown attached by the ranker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub matched_required: Vec<String>,
    pub matched_preferred: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Search criteria sent to every source connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_experience: Option<f32>,
    /// Result cap per source
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    25
}

impl SearchCriteria {
    pub fn for_skills(skills: &[&str]) -> Self {
        Self {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            location: None,
            min_experience: None,
            limit: default_limit(),
        }
    }
}
