//! Pool insights and outreach recommendations.
//!
//! Derives aggregate statistics from a ranked, validated candidate set and
//! builds a per-candidate outreach plan for the strongest matches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sourcing::{Candidate, VerificationStatus};

/// Candidates considered for the pool-quality label and outreach plans.
const TOP_CANDIDATES: usize = 5;

/// Aggregate statistics over one collection result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInsights {
    pub total_candidates: usize,
    pub verified_candidates: usize,
    pub verified_percentage: f64,
    pub average_cross_source_score: f64,
    /// Qualitative label derived from the top-5 average match score
    pub pool_quality: String,
    /// Candidates returned per source
    pub source_effectiveness: HashMap<String, usize>,
    /// Most common missing required skills, most frequent first
    pub top_missing_skills: Vec<SkillGap>,
}

/// A required skill the pool is short on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    /// Number of candidates missing it
    pub affected: usize,
}

/// Outreach recommendation for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachPlan {
    pub candidate_id: String,
    pub candidate_name: String,
    pub approach: String,
    pub talking_points: Vec<String>,
    pub estimated_response_rate: String,
    pub contact_channel: String,
}

/// Compute aggregate statistics for a ranked, validated candidate set.
pub fn pool_insights(candidates: &[Candidate]) -> PoolInsights {
    let total = candidates.len();
    let verified = candidates
        .iter()
        .filter(|c| c.verification == VerificationStatus::Verified)
        .count();

    let average_cross_source_score = if total == 0 {
        0.0
    } else {
        candidates
            .iter()
            .map(|c| c.cross_source_score as f64)
            .sum::<f64>()
            / total as f64
    };

    let mut source_effectiveness: HashMap<String, usize> = HashMap::new();
    for candidate in candidates {
        for source in &candidate.sources_found {
            *source_effectiveness.entry(source.clone()).or_insert(0) += 1;
        }
    }

    let mut gap_counts: HashMap<String, usize> = HashMap::new();
    for candidate in candidates {
        for skill in &candidate.match_details.missing_skills {
            *gap_counts.entry(skill.clone()).or_insert(0) += 1;
        }
    }
    let mut top_missing_skills: Vec<SkillGap> = gap_counts
        .into_iter()
        .map(|(skill, affected)| SkillGap { skill, affected })
        .collect();
    top_missing_skills.sort_by(|a, b| b.affected.cmp(&a.affected).then_with(|| a.skill.cmp(&b.skill)));
    top_missing_skills.truncate(TOP_CANDIDATES);

    PoolInsights {
        total_candidates: total,
        verified_candidates: verified,
        verified_percentage: if total == 0 {
            0.0
        } else {
            verified as f64 * 100.0 / total as f64
        },
        average_cross_source_score,
        pool_quality: pool_quality(candidates).to_string(),
        source_effectiveness,
        top_missing_skills,
    }
}

/// Qualitative pool label from the top-5 average match score.
fn pool_quality(candidates: &[Candidate]) -> &'static str {
    if candidates.is_empty() {
        return "Poor";
    }
    let top: Vec<u32> = candidates
        .iter()
        .take(TOP_CANDIDATES)
        .map(|c| c.match_score)
        .collect();
    let average = top.iter().sum::<u32>() as f64 / top.len() as f64;

    if average > 85.0 {
        "Excellent"
    } else if average > 70.0 {
        "Good"
    } else if average > 50.0 {
        "Fair"
    } else {
        "Poor"
    }
}

/// Build outreach plans for the top 5 candidates by score.
///
/// Expects the slice to already be ranked (descending match score).
pub fn outreach_plans(candidates: &[Candidate]) -> Vec<OutreachPlan> {
    candidates
        .iter()
        .take(TOP_CANDIDATES)
        .map(|candidate| OutreachPlan {
            candidate_id: candidate.id.clone(),
            candidate_name: candidate.name.clone(),
            approach: if candidate.match_score > 90 {
                "High-Touch Personalized".to_string()
            } else {
                "Standard Outreach".to_string()
            },
            talking_points: talking_points(candidate),
            estimated_response_rate: response_rate(candidate).to_string(),
            contact_channel: contact_channel(candidate),
        })
        .collect()
}

fn talking_points(candidate: &Candidate) -> Vec<String> {
    let mut points = Vec::new();

    if !candidate.match_details.matched_required.is_empty() {
        points.push(format!(
            "Strong alignment on {}",
            candidate.match_details.matched_required.join(", ")
        ));
    }
    if candidate.experience_years >= 1.0 {
        points.push(format!(
            "{:.0} years of relevant experience",
            candidate.experience_years
        ));
    }
    if candidate.verification == VerificationStatus::Verified {
        points.push(format!(
            "Profile corroborated by {} independent sources",
            candidate.sources_found.len()
        ));
    }
    if points.is_empty() {
        points.push("Potential fit worth an exploratory conversation".to_string());
    }

    points
}

fn response_rate(candidate: &Candidate) -> &'static str {
    let verified = candidate.verification == VerificationStatus::Verified;
    if verified && candidate.match_score > 90 {
        "High (60-75%)"
    } else if candidate.match_score > 75 {
        "Moderate (40-60%)"
    } else {
        "Low (20-40%)"
    }
}

/// Best available channel: email, then phone, then the platform the
/// candidate was found on.
fn contact_channel(candidate: &Candidate) -> String {
    if candidate.email.is_some() {
        "email".to_string()
    } else if candidate.phone.is_some() {
        "phone".to_string()
    } else if let Some(source) = candidate.sources_found.first() {
        format!("via {}", source)
    } else {
        "unknown".to_string()
    }
}
