// Recommendation Merger
//
// Blends similarity-ranked candidates (Tier A, from the vector store) with
// not-yet-embedded fallback candidates (Tier B, score 0) into one
// deduplicated, paginated list. A vector store failure degrades to the
// fallback tier instead of failing the request: an unranked contact list
// beats no list.

use crate::directory::ContactDirectory;
use crate::errors::Result;
use crate::profile::{PointPayload, ScoredPoint};
use crate::store::{KindFilter, QueryFilter, VectorStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Minimum similarity for a Tier A hit. Anything below this is noise and is
/// better served by the fallback tier.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;

/// Which pool recommendations are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendTarget {
    /// Other people's connections the user might want to meet
    Connections,
    /// Other users of the system
    People,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Embedding,
    Fallback,
}

/// One recommended contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub score: f32,
    pub payload: Option<PointPayload>,
    pub source: CandidateSource,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub total_results: usize,
    pub current_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationPage {
    pub recommendations: Vec<Candidate>,
    pub pagination: Pagination,
}

/// Classify a similarity score into a human-readable match reason
pub fn match_reason(score: f32) -> &'static str {
    if score >= 0.8 {
        "very similar profile and interests"
    } else if score >= 0.6 {
        "similar background and industry"
    } else if score >= 0.4 {
        "some shared interests and experience"
    } else {
        "matches your search criteria"
    }
}

pub struct Recommender {
    store: Arc<Mutex<dyn VectorStore>>,
    directory: Arc<Mutex<dyn ContactDirectory>>,
    score_threshold: f32,
}

impl Recommender {
    pub fn new(
        store: Arc<Mutex<dyn VectorStore>>,
        directory: Arc<Mutex<dyn ContactDirectory>>,
    ) -> Self {
        Self {
            store,
            directory,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }

    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// Produce one page of recommendations for a user.
    ///
    /// `offset` past the end of the candidate set yields an empty page, not
    /// an error.
    pub fn recommend(
        &self,
        user_id: &str,
        target: RecommendTarget,
        limit: usize,
        offset: usize,
    ) -> Result<RecommendationPage> {
        let limit = limit.max(1);

        let directory = match self.directory.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Never recommend the caller or anyone they already know
        let mut exclusion: HashSet<String> = HashSet::new();
        exclusion.insert(user_id.to_string());
        exclusion.extend(directory.list_connection_ids(user_id)?);

        let pool = match target {
            RecommendTarget::Connections => directory.all_connection_ids()?,
            RecommendTarget::People => directory.all_user_ids()?,
        };

        // Tier A: similarity-ranked hits against the caller's own embedding
        let tier_a = self.ranked_candidates(user_id, target, &exclusion, pool.len());

        let tier_a_ids: HashSet<String> = tier_a.iter().map(|p| p.id.clone()).collect();

        // Tier B: everyone left over, score 0 as an explicit "no embedding
        // yet" placeholder
        let remaining: Vec<String> = pool
            .into_iter()
            .filter(|id| !exclusion.contains(id) && !tier_a_ids.contains(id))
            .collect();
        let fallback_profiles = directory.get_connections_by_ids(&remaining)?;
        drop(directory);

        let mut candidates: Vec<Candidate> = Vec::with_capacity(tier_a.len() + remaining.len());
        for hit in tier_a {
            candidates.push(Candidate {
                reason: match_reason(hit.score).to_string(),
                id: hit.id,
                score: hit.score,
                payload: Some(hit.payload),
                source: CandidateSource::Embedding,
            });
        }
        for profile in fallback_profiles {
            candidates.push(Candidate {
                id: profile.id.clone(),
                score: 0.0,
                payload: Some(PointPayload::from_profile(&profile)),
                source: CandidateSource::Fallback,
                reason: match_reason(0.0).to_string(),
            });
        }

        // Stable sort: ties keep their insertion order so pagination is
        // deterministic across requests
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_results = candidates.len();
        let page: Vec<Candidate> = candidates.into_iter().skip(offset).take(limit).collect();

        debug!(
            "Recommendations for {}: {} total, page offset {} -> {} items",
            user_id,
            total_results,
            offset,
            page.len()
        );

        Ok(RecommendationPage {
            pagination: Pagination {
                current_page: offset / limit + 1,
                total_pages: total_results.div_ceil(limit),
                has_more: total_results > offset + limit,
                total_results,
                current_count: page.len(),
            },
            recommendations: page,
        })
    }

    /// Tier A lookup. Any store failure (or a caller without an embedding)
    /// resolves to an empty tier so the request can still be served from
    /// the fallback pool.
    fn ranked_candidates(
        &self,
        user_id: &str,
        target: RecommendTarget,
        exclusion: &HashSet<String>,
        pool_size: usize,
    ) -> Vec<ScoredPoint> {
        if pool_size == 0 {
            return Vec::new();
        }

        let store = match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let own = match store.fetch(user_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("User {} has no embedding yet, serving fallback only", user_id);
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "Vector store fetch failed for {}: {} - degrading to fallback tier",
                    user_id, e
                );
                return Vec::new();
            }
        };

        let filter = QueryFilter {
            kind: Some(match target {
                RecommendTarget::Connections => KindFilter::Connection,
                RecommendTarget::People => KindFilter::User,
            }),
            exclude_ids: exclusion.clone(),
        };

        match store.query(&own.vector, &filter, pool_size, self.score_threshold) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(
                    "Vector store query failed for {}: {} - degrading to fallback tier",
                    user_id, e
                );
                Vec::new()
            }
        }
    }
}
