// HNSW backend
//
// In-memory ANN index over hnsw_rs. This is the "native" strategy: the
// index itself returns a ranked, limited top-K and the filter is applied
// during the search walk, so callers get final results straight back.

use super::{QueryFilter, VectorStore};
use crate::embeddings::cosine_similarity;
use crate::errors::{Result, RoloError};
use crate::profile::{PointRecord, ScoredPoint};
use hnsw_rs::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

const HNSW_MAX_LAYERS: usize = 16;
const HNSW_MAX_CONNECTIONS: usize = 32;
const HNSW_EF_CONSTRUCTION: usize = 400;

pub struct HnswStore {
    dimensions: usize,
    points: HashMap<String, PointRecord>,
    index: Option<Hnsw<'static, f32, DistCosine>>,
    /// HNSW works on usize ids; this maps them back to point ids.
    /// Built from id-sorted points so index construction is deterministic.
    id_mapping: Vec<String>,
}

impl HnswStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            points: HashMap::new(),
            index: None,
            id_mapping: Vec::new(),
        }
    }

    fn rebuild_index(&mut self) {
        if self.points.is_empty() {
            self.index = None;
            self.id_mapping.clear();
            return;
        }

        let nb_elem = self.points.len();
        debug!(
            "Building HNSW index: {} vectors, max_conn={}, ef_c={}",
            nb_elem, HNSW_MAX_CONNECTIONS, HNSW_EF_CONSTRUCTION
        );

        let mut index = Hnsw::<'static, f32, DistCosine>::new(
            HNSW_MAX_CONNECTIONS,
            nb_elem,
            HNSW_MAX_LAYERS,
            HNSW_EF_CONSTRUCTION,
            DistCosine {},
        );

        // HashMap iteration order is non-deterministic; sort by id so the
        // same point set always builds the same index
        let mut sorted: Vec<&PointRecord> = self.points.values().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        self.id_mapping.clear();
        self.id_mapping.reserve(nb_elem);

        let mut data_for_insertion = Vec::with_capacity(nb_elem);
        for (idx, point) in sorted.iter().enumerate() {
            self.id_mapping.push(point.id.clone());
            data_for_insertion.push((&point.vector, idx));
        }

        index.parallel_insert(&data_for_insertion);
        index.set_searching_mode(true);
        self.index = Some(index);
    }

    /// Brute-force scan, used when the index is unavailable or fails
    fn search_linear(
        &self,
        vector: &[f32],
        filter: &QueryFilter,
        limit: usize,
        score_threshold: f32,
    ) -> Vec<ScoredPoint> {
        let mut results = Vec::new();

        for point in self.points.values() {
            let score = cosine_similarity(vector, &point.vector);
            if score < score_threshold {
                continue;
            }
            let scored = ScoredPoint {
                id: point.id.clone(),
                score,
                payload: point.payload.clone(),
            };
            if filter.matches(&scored) {
                results.push(scored);
            }
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        results.truncate(limit);
        results
    }

    fn search_index(
        &self,
        index: &Hnsw<'static, f32, DistCosine>,
        vector: &[f32],
        filter: &QueryFilter,
        limit: usize,
        score_threshold: f32,
    ) -> Vec<ScoredPoint> {
        // Search wider than the limit so excluded neighbors don't starve
        // the result set
        let knbn = (limit + filter.exclude_ids.len()).min(self.points.len()).max(1);
        let ef_search = (knbn * 2).max(50);

        let neighbors = index.search(vector, knbn, ef_search);

        let mut results = Vec::new();
        for neighbor in neighbors {
            let idx = neighbor.d_id;
            if idx >= self.id_mapping.len() {
                warn!("HNSW returned invalid id: {}", idx);
                continue;
            }

            let point = match self.points.get(&self.id_mapping[idx]) {
                Some(p) => p,
                None => {
                    warn!("Point {} missing from store", self.id_mapping[idx]);
                    continue;
                }
            };

            let score = cosine_similarity(vector, &point.vector);
            if score < score_threshold {
                continue;
            }
            let scored = ScoredPoint {
                id: point.id.clone(),
                score,
                payload: point.payload.clone(),
            };
            if filter.matches(&scored) {
                results.push(scored);
            }
        }

        // HNSW returns ranked neighbors already, but re-sort to be sure
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        results.truncate(limit);
        results
    }
}

impl VectorStore for HnswStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn upsert(&mut self, points: Vec<PointRecord>) -> Result<()> {
        // Validate the whole batch before touching the store
        for point in &points {
            if point.vector.len() != self.dimensions {
                return Err(RoloError::DimensionMismatch {
                    expected: self.dimensions,
                    got: point.vector.len(),
                });
            }
        }

        let count = points.len();
        for point in points {
            self.points.insert(point.id.clone(), point);
        }
        self.rebuild_index();

        debug!("Upserted {} points, store now holds {}", count, self.points.len());
        Ok(())
    }

    fn query(
        &self,
        vector: &[f32],
        filter: &QueryFilter,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredPoint>> {
        if vector.len() != self.dimensions {
            return Err(RoloError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }

        if limit == 0 || self.points.is_empty() {
            return Ok(Vec::new());
        }

        match &self.index {
            Some(index) => {
                let hits = self.search_index(index, vector, filter, limit, score_threshold);
                // The index walk oversamples for exclusions only; a kind
                // filter can still consume every sampled neighbor when the
                // matching kind is a minority. A short page gets the exact
                // scan instead.
                if hits.len() < limit && self.points.len() > hits.len() {
                    debug!(
                        "Index returned {} of {} requested hits, rescanning exactly",
                        hits.len(),
                        limit
                    );
                    return Ok(self.search_linear(vector, filter, limit, score_threshold));
                }
                Ok(hits)
            }
            None => Ok(self.search_linear(vector, filter, limit, score_threshold)),
        }
    }

    fn fetch(&self, id: &str) -> Result<Option<PointRecord>> {
        Ok(self.points.get(id).cloned())
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}
