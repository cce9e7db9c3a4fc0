//! Source connectors - external talent pools queried uniformly by name.

use async_trait::async_trait;

use super::{skill_matches, Candidate, SearchCriteria};

/// A named candidate source.
///
/// Connectors are external collaborators: the collector treats every
/// implementation uniformly and tolerates individual failures.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// The source label, e.g. `linkedin` or `internal_db`.
    fn name(&self) -> &str;

    /// Query the source for candidates matching the criteria.
    async fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<Candidate>>;
}

/// HTTP connector for JSON search endpoints.
///
/// POSTs the criteria to `{base_url}/search` and expects a JSON array of
/// candidate records.
pub struct HttpSourceConnector {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpSourceConnector {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceConnector for HttpSourceConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<Candidate>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let response = self.client.post(&url).json(criteria).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Source '{}' returned {}: {}", self.name, status, body);
        }

        let candidates: Vec<Candidate> = response.json().await?;
        tracing::debug!(
            source = %self.name,
            count = candidates.len(),
            "Source query returned"
        );
        Ok(candidates)
    }
}

/// In-memory source backed by a fixed candidate list.
///
/// Filters its records by the requested skills and experience floor; used in
/// tests and as a demo pool when no HTTP sources are configured.
pub struct StaticSource {
    name: String,
    candidates: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }
}

#[async_trait]
impl SourceConnector for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<Candidate>> {
        let matches = self
            .candidates
            .iter()
            .filter(|candidate| {
                criteria.skills.is_empty()
                    || criteria.skills.iter().any(|wanted| {
                        candidate
                            .skills
                            .iter()
                            .any(|skill| skill_matches(skill, wanted))
                    })
            })
            .filter(|candidate| {
                criteria
                    .min_experience
                    .map(|min| candidate.experience_years >= min)
                    .unwrap_or(true)
            })
            .take(criteria.limit)
            .cloned()
            .collect();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> StaticSource {
        StaticSource::new(
            "pool",
            vec![
                Candidate::profile("c1", "Ada", &["Rust", "Distributed Systems"], 8.0),
                Candidate::profile("c2", "Sam", &["React", "TypeScript"], 3.0),
                Candidate::profile("c3", "Kim", &["Go"], 5.0),
            ],
        )
    }

    #[tokio::test]
    async fn static_source_filters_by_skill() {
        let results = pool()
            .search(&SearchCriteria::for_skills(&["rust"]))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "c1");
    }

    #[tokio::test]
    async fn static_source_applies_experience_floor() {
        let mut criteria = SearchCriteria::for_skills(&["react"]);
        criteria.min_experience = Some(5.0);
        let results = pool().search(&criteria).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn static_source_respects_limit() {
        let mut criteria = SearchCriteria::for_skills(&[]);
        criteria.limit = 2;
        let results = pool().search(&criteria).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
