//! Concurrent multi-source candidate collection with identity merging.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future;

use super::{skill_matches, Candidate, SearchCriteria, SourceConnector};

/// Result of one collection pass.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    /// Deduplicated candidates; `sources_found` lists every source that
    /// returned the identity.
    pub candidates: Vec<Candidate>,
    /// Raw per-source records by candidate id, kept for consistency checks.
    pub observations: HashMap<String, Vec<Candidate>>,
    /// Sources whose query succeeded.
    pub succeeded_sources: Vec<String>,
    /// Sources whose query failed (their contribution is empty).
    pub failed_sources: Vec<String>,
}

/// Fans out one query per source, awaits all, and merges the results.
///
/// # Failure policy
/// A failing source never fails the collection; the outcome is the union of
/// whatever sources succeeded. All sources failing yields an empty set - the
/// caller decides whether that is fatal.
///
/// # Ordering
/// No ordering guarantee across sources; final order is the ranker's job.
pub struct SourceCollector;

impl SourceCollector {
    /// Query every source concurrently and merge duplicate identities.
    pub async fn collect(
        sources: &[Arc<dyn SourceConnector>],
        criteria: &SearchCriteria,
    ) -> CollectionOutcome {
        let queries = sources.iter().map(|connector| {
            let connector = Arc::clone(connector);
            async move {
                let name = connector.name().to_string();
                let result = connector.search(criteria).await;
                (name, result)
            }
        });

        let results = future::join_all(queries).await;

        let mut outcome = CollectionOutcome::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (source, result) in results {
            match result {
                Ok(mut found) => {
                    found.truncate(criteria.limit);
                    tracing::debug!(source = %source, count = found.len(), "Merged source results");
                    for candidate in found {
                        Self::merge(&mut outcome, &mut index, &source, candidate);
                    }
                    outcome.succeeded_sources.push(source);
                }
                Err(e) => {
                    tracing::warn!(source = %source, "Source query failed: {}", e);
                    outcome.failed_sources.push(source);
                }
            }
        }

        outcome
    }

    /// Merge one raw record into the deduplicated set.
    fn merge(
        outcome: &mut CollectionOutcome,
        index: &mut HashMap<String, usize>,
        source: &str,
        mut candidate: Candidate,
    ) {
        if candidate.id.trim().is_empty() {
            tracing::warn!(source = %source, "Dropping candidate with empty id");
            return;
        }

        let mut raw = candidate.clone();
        raw.source = source.to_string();
        outcome
            .observations
            .entry(candidate.id.clone())
            .or_default()
            .push(raw);

        match index.get(&candidate.id) {
            Some(&at) => {
                let existing = &mut outcome.candidates[at];
                if !existing.sources_found.iter().any(|s| s == source) {
                    existing.sources_found.push(source.to_string());
                }
                // Union skills; fill fields the first record was missing.
                for skill in candidate.skills.drain(..) {
                    if !existing.skills.iter().any(|s| skill_matches(s, &skill)) {
                        existing.skills.push(skill);
                    }
                }
                if existing.education.is_none() {
                    existing.education = candidate.education;
                }
                if existing.email.is_none() {
                    existing.email = candidate.email;
                }
                if existing.phone.is_none() {
                    existing.phone = candidate.phone;
                }
            }
            None => {
                candidate.source = source.to_string();
                candidate.sources_found = vec![source.to_string()];
                index.insert(candidate.id.clone(), outcome.candidates.len());
                outcome.candidates.push(candidate);
            }
        }
    }
}
