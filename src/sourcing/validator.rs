//! Cross-source verification scoring.

use std::collections::HashMap;

use super::{Candidate, ConsistencyReport, VerificationStatus};

/// Scoring policy for cross-source verification.
///
/// The constants are policy, not law: callers may tune them, but the scoring
/// function stays deterministic and monotone in the number of corroborating
/// sources for any choice of values.
#[derive(Debug, Clone, Copy)]
pub struct VerificationPolicy {
    /// Confidence for a candidate found in exactly one source
    pub base_score: u32,
    /// Added per additional corroborating source
    pub per_source_bonus: u32,
    /// Minimum score for `verified` status
    pub verified_threshold: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            base_score: 50,
            per_source_bonus: 10,
            verified_threshold: 70,
        }
    }
}

impl VerificationPolicy {
    /// Score for a candidate found in `source_count` independent sources.
    ///
    /// # Properties
    /// - Monotone non-decreasing in `source_count`
    /// - Always within [0, 100]
    pub fn score(&self, source_count: usize) -> u32 {
        if source_count == 0 {
            return 0;
        }
        let extra = (source_count - 1) as u32;
        self.base_score
            .saturating_add(self.per_source_bonus.saturating_mul(extra))
            .min(100)
    }
}

/// Computes verification confidence and field-consistency for collected candidates.
pub struct CrossSourceValidator {
    policy: VerificationPolicy,
}

impl CrossSourceValidator {
    pub fn new(policy: VerificationPolicy) -> Self {
        Self { policy }
    }

    /// Annotate every candidate with its cross-source score, verification
    /// status, and consistency report.
    ///
    /// `observations` maps candidate id to the raw per-source records the
    /// collector saw; identities with fewer than two observations get a
    /// neutral consistency record.
    pub fn validate(
        &self,
        candidates: &mut [Candidate],
        observations: &HashMap<String, Vec<Candidate>>,
    ) {
        for candidate in candidates.iter_mut() {
            candidate.cross_source_score = self.policy.score(candidate.sources_found.len());
            candidate.verification = if candidate.cross_source_score >= self.policy.verified_threshold
            {
                VerificationStatus::Verified
            } else {
                VerificationStatus::Unverified
            };
            candidate.consistency = observations
                .get(&candidate.id)
                .map(|records| Self::consistency_of(records))
                .unwrap_or_default();
        }
    }

    /// Field agreement across the raw records of one identity.
    ///
    /// Checks name (case-insensitive), experience (one-year tolerance), and
    /// education (when both records carry one) pairwise against the first
    /// record. Score is the hit ratio scaled to 0-100.
    fn consistency_of(records: &[Candidate]) -> ConsistencyReport {
        if records.len() < 2 {
            return ConsistencyReport::default();
        }

        let reference = &records[0];
        let mut checks = 0u32;
        let mut hits = 0u32;

        for other in &records[1..] {
            checks += 1;
            if reference.name.eq_ignore_ascii_case(&other.name) {
                hits += 1;
            }

            checks += 1;
            if (reference.experience_years - other.experience_years).abs() <= 1.0 {
                hits += 1;
            }

            if let (Some(a), Some(b)) = (&reference.education, &other.education) {
                checks += 1;
                if a.eq_ignore_ascii_case(b) {
                    hits += 1;
                }
            }
        }

        ConsistencyReport {
            cross_checked: true,
            score: if checks == 0 { 0 } else { hits * 100 / checks },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_monotone_in_source_count() {
        let policy = VerificationPolicy::default();
        let mut previous = 0;
        for count in 1..12 {
            let score = policy.score(count);
            assert!(score >= previous, "score dropped at count {}", count);
            assert!(score <= 100);
            previous = score;
        }
    }

    #[test]
    fn default_policy_thresholds() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.score(1), 50);
        assert_eq!(policy.score(2), 60);
        assert_eq!(policy.score(3), 70);
        assert_eq!(policy.score(10), 100);
    }

    #[test]
    fn verification_status_follows_threshold() {
        let validator = CrossSourceValidator::new(VerificationPolicy::default());

        let mut single = Candidate::profile("c1", "Ada", &["Rust"], 5.0);
        single.sources_found = vec!["A".to_string()];
        let mut triple = Candidate::profile("c2", "Sam", &["Go"], 3.0);
        triple.sources_found = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let mut candidates = vec![single, triple];
        validator.validate(&mut candidates, &HashMap::new());

        assert_eq!(candidates[0].verification, VerificationStatus::Unverified);
        assert_eq!(candidates[1].verification, VerificationStatus::Verified);
        assert!(candidates[1].cross_source_score > candidates[0].cross_source_score);
    }

    #[test]
    fn consistency_neutral_for_single_source() {
        let records = vec![Candidate::profile("c1", "Ada", &["Rust"], 5.0)];
        let report = CrossSourceValidator::consistency_of(&records);
        assert!(!report.cross_checked);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn consistency_full_agreement() {
        let a = Candidate::profile("c1", "Ada", &["Rust"], 5.0);
        let mut b = Candidate::profile("c1", "ada", &["Rust"], 5.5);
        b.source = "B".to_string();
        let report = CrossSourceValidator::consistency_of(&[a, b]);
        assert!(report.cross_checked);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn consistency_flags_disagreement() {
        let a = Candidate::profile("c1", "Ada", &["Rust"], 5.0);
        let b = Candidate::profile("c1", "Adalyn", &["Rust"], 12.0);
        let report = CrossSourceValidator::consistency_of(&[a, b]);
        assert!(report.cross_checked);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn same_sources_always_same_score() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.score(4), policy.score(4));
    }
}
