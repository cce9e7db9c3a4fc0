//! Explainable multi-factor candidate ranking.

use super::{skill_matches, Candidate, MatchDetails};

/// Scoring weights. Must sum to 100.
///
/// Weight for a criterion the caller did not supply (no preferred skills, no
/// experience target, cultural fit not prioritized) folds back into required
/// coverage, so a search that only names required skills scores on coverage
/// alone.
#[derive(Debug, Clone, Copy)]
pub struct RankingWeights {
    /// Required-skill coverage ratio weight
    pub required: u32,
    /// Preferred-skill coverage ratio weight
    pub preferred: u32,
    /// Experience-sufficiency ratio weight (ratio capped at 1.0)
    pub experience: u32,
    /// Cultural-fit weight, applied only when the caller prioritizes fit
    pub cultural: u32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            required: 50,
            preferred: 20,
            experience: 20,
            cultural: 10,
        }
    }
}

/// Fixed neutral cultural-fit signal (0-100).
///
/// There is no real fit signal in the pipeline yet; a fixed neutral value
/// keeps scoring deterministic until one exists.
const NEUTRAL_CULTURAL_FIT: u32 = 70;

/// One ranking request.
#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    /// Experience target in years; `None` removes the criterion
    pub target_experience: Option<f32>,
    pub prioritize_cultural_fit: bool,
}

/// Scores and sorts candidates with an explainable breakdown.
pub struct CandidateRanker {
    weights: RankingWeights,
}

impl CandidateRanker {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    /// Score every candidate and sort descending.
    ///
    /// Tie-break is ascending candidate id, so equal scores always order the
    /// same way.
    pub fn rank(&self, candidates: &mut Vec<Candidate>, request: &RankingRequest) {
        for candidate in candidates.iter_mut() {
            let (score, details) = self.score(candidate, request);
            candidate.match_score = score;
            candidate.match_details = details;
        }
        candidates.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Score one candidate. Result is rounded and clamped to [0, 100].
    pub fn score(&self, candidate: &Candidate, request: &RankingRequest) -> (u32, MatchDetails) {
        let weights = self.effective_weights(request);

        let matched_required: Vec<String> = request
            .required_skills
            .iter()
            .filter(|wanted| {
                candidate
                    .skills
                    .iter()
                    .any(|skill| skill_matches(skill, wanted))
            })
            .cloned()
            .collect();

        let matched_preferred: Vec<String> = request
            .preferred_skills
            .iter()
            .filter(|wanted| {
                candidate
                    .skills
                    .iter()
                    .any(|skill| skill_matches(skill, wanted))
            })
            .cloned()
            .collect();

        let missing_skills: Vec<String> = request
            .required_skills
            .iter()
            .filter(|wanted| !matched_required.contains(wanted))
            .cloned()
            .collect();

        let required_ratio = if request.required_skills.is_empty() {
            1.0
        } else {
            matched_required.len() as f64 / request.required_skills.len() as f64
        };

        let preferred_ratio = if request.preferred_skills.is_empty() {
            0.0
        } else {
            matched_preferred.len() as f64 / request.preferred_skills.len() as f64
        };

        let experience_ratio = match request.target_experience {
            Some(target) if target > 0.0 => {
                (candidate.experience_years as f64 / target as f64).min(1.0)
            }
            _ => 0.0,
        };

        let mut total = required_ratio * weights.required as f64
            + preferred_ratio * weights.preferred as f64
            + experience_ratio * weights.experience as f64;

        if weights.cultural > 0 {
            total += (NEUTRAL_CULTURAL_FIT as f64 / 100.0) * weights.cultural as f64;
        }

        let score = total.round().clamp(0.0, 100.0) as u32;

        (
            score,
            MatchDetails {
                matched_required,
                matched_preferred,
                missing_skills,
            },
        )
    }

    /// Redistribute the weight of absent criteria into required coverage.
    fn effective_weights(&self, request: &RankingRequest) -> RankingWeights {
        let mut weights = self.weights;
        if !request.prioritize_cultural_fit {
            weights.required += weights.cultural;
            weights.cultural = 0;
        }
        if request.preferred_skills.is_empty() {
            weights.required += weights.preferred;
            weights.preferred = 0;
        }
        if request.target_experience.map(|t| t <= 0.0).unwrap_or(true) {
            weights.required += weights.experience;
            weights.experience = 0;
        }
        weights
    }
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self::new(RankingWeights::default())
    }
}
