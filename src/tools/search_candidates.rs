//! Candidate search tool - the full sourcing pipeline behind one tool call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Tool;
use crate::insights;
use crate::sourcing::{
    CandidateRanker, CrossSourceValidator, RankingRequest, RankingWeights, SearchCriteria,
    SourceCollector, SourceConnector, VerificationPolicy,
};

/// Arguments accepted by `search_candidates`.
#[derive(Debug, Deserialize)]
struct SearchArgs {
    skills: Vec<String>,
    #[serde(default)]
    preferred_skills: Vec<String>,
    #[serde(default)]
    experience: Option<f32>,
    #[serde(default)]
    location: Option<String>,
    /// Restrict the query to these source names; all configured sources otherwise
    #[serde(default)]
    sources: Option<Vec<String>>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    prioritize_cultural_fit: bool,
}

/// Searches every configured source concurrently, merges and verifies the
/// results, and returns a ranked candidate list with insights and outreach
/// recommendations.
pub struct SearchCandidates {
    sources: Vec<Arc<dyn SourceConnector>>,
    policy: VerificationPolicy,
    weights: RankingWeights,
    default_limit: usize,
}

impl SearchCandidates {
    pub fn new(sources: Vec<Arc<dyn SourceConnector>>) -> Self {
        Self {
            sources,
            policy: VerificationPolicy::default(),
            weights: RankingWeights::default(),
            default_limit: 25,
        }
    }

    /// Override the verification policy (testing and tenant tuning).
    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Select the connectors this call should query.
    fn select_sources(&self, requested: &Option<Vec<String>>) -> Vec<Arc<dyn SourceConnector>> {
        match requested {
            Some(names) if !names.is_empty() => self
                .sources
                .iter()
                .filter(|c| names.iter().any(|n| n.eq_ignore_ascii_case(c.name())))
                .cloned()
                .collect(),
            _ => self.sources.clone(),
        }
    }
}

#[async_trait]
impl Tool for SearchCandidates {
    fn name(&self) -> &str {
        "search_candidates"
    }

    fn description(&self) -> &str {
        "Search all configured candidate sources for profiles matching the given \
         skills, merge duplicates found in multiple sources, verify them against \
         each other, and return a ranked list with pool insights and outreach \
         recommendations."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "skills": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Required skills, e.g. [\"React\", \"TypeScript\"]"
                },
                "preferred_skills": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Nice-to-have skills"
                },
                "experience": {
                    "type": "number",
                    "description": "Target years of experience"
                },
                "location": {
                    "type": "string",
                    "description": "Preferred candidate location"
                },
                "sources": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Source names to query; omit for all configured sources"
                },
                "limit": {
                    "type": "integer",
                    "description": "Result cap per source"
                },
                "prioritize_cultural_fit": {
                    "type": "boolean",
                    "description": "Weigh cultural fit into the match score"
                }
            },
            "required": ["skills"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let args: SearchArgs = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("Invalid search_candidates arguments: {}", e))?;

        let sources = self.select_sources(&args.sources);
        if sources.is_empty() {
            tracing::warn!("search_candidates invoked with no matching sources");
        }

        let criteria = SearchCriteria {
            skills: args.skills.clone(),
            location: args.location,
            min_experience: args.experience,
            limit: args.limit.unwrap_or(self.default_limit),
        };

        let mut outcome = SourceCollector::collect(&sources, &criteria).await;

        CrossSourceValidator::new(self.policy)
            .validate(&mut outcome.candidates, &outcome.observations);

        let request = RankingRequest {
            required_skills: args.skills,
            preferred_skills: args.preferred_skills,
            target_experience: args.experience,
            prioritize_cultural_fit: args.prioritize_cultural_fit,
        };
        CandidateRanker::new(self.weights).rank(&mut outcome.candidates, &request);

        let pool = insights::pool_insights(&outcome.candidates);
        let outreach = insights::outreach_plans(&outcome.candidates);

        tracing::info!(
            candidates = outcome.candidates.len(),
            verified = pool.verified_candidates,
            failed_sources = outcome.failed_sources.len(),
            "Candidate search complete"
        );

        Ok(json!({
            "candidates": outcome.candidates,
            "insights": pool,
            "outreach": outreach,
            "sources_queried": outcome.succeeded_sources,
            "sources_failed": outcome.failed_sources,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcing::Candidate;
    use async_trait::async_trait;

    /// Connector that returns its records for any query, like a source whose
    /// own relevance filtering is opaque to us.
    struct FixedSource {
        name: String,
        records: Vec<Candidate>,
    }

    #[async_trait]
    impl SourceConnector for FixedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(&self, _criteria: &SearchCriteria) -> anyhow::Result<Vec<Candidate>> {
            Ok(self.records.clone())
        }
    }

    fn source(name: &str, records: Vec<Candidate>) -> Arc<dyn SourceConnector> {
        Arc::new(FixedSource {
            name: name.to_string(),
            records,
        })
    }

    fn tool() -> SearchCandidates {
        let mut ada_b = Candidate::profile("c1", "Ada", &["React"], 4.0);
        ada_b.email = Some("ada@example.com".to_string());
        SearchCandidates::new(vec![
            source("A", vec![Candidate::profile("c1", "Ada", &["React"], 4.0)]),
            source(
                "B",
                vec![ada_b, Candidate::profile("c2", "Sam", &["Go"], 2.0)],
            ),
        ])
    }

    #[tokio::test]
    async fn end_to_end_pipeline_ranks_and_reports() {
        let result = tool()
            .execute(json!({"skills": ["React"]}))
            .await
            .unwrap();

        let candidates = result["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 2);
        // c1 corroborated by both sources and fully covered; ranked first.
        assert_eq!(candidates[0]["id"], "c1");
        assert_eq!(candidates[0]["match_score"], 100);
        assert_eq!(
            candidates[0]["sources_found"],
            json!(["A", "B"])
        );
        assert_eq!(candidates[1]["match_score"], 0);

        assert_eq!(result["insights"]["total_candidates"], 2);
        assert!(result["outreach"].as_array().unwrap().len() <= 5);
    }

    #[tokio::test]
    async fn source_filter_restricts_the_query() {
        let result = tool()
            .execute(json!({"skills": ["React"], "sources": ["B"]}))
            .await
            .unwrap();

        let candidates = result["candidates"].as_array().unwrap();
        let c1 = candidates.iter().find(|c| c["id"] == "c1").unwrap();
        assert_eq!(c1["sources_found"], json!(["B"]));
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let err = tool().execute(json!({"skills": "React"})).await.unwrap_err();
        assert!(err.to_string().contains("Invalid search_candidates arguments"));
    }

    #[tokio::test]
    async fn no_sources_yields_empty_result_not_error() {
        let empty = SearchCandidates::new(Vec::new());
        let result = empty.execute(json!({"skills": ["React"]})).await.unwrap();
        assert!(result["candidates"].as_array().unwrap().is_empty());
        assert_eq!(result["insights"]["pool_quality"], "Poor");
    }
}
