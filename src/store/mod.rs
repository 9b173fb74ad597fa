// Vector Store Module
//
// One upsert/query interface over two backend shapes: an in-memory HNSW
// index that ranks and limits natively, and a SQLite store whose nearest-
// documents query returns a broad candidate set that gets filtered in
// process. Callers never branch on which backend is active.

use crate::errors::Result;
use crate::profile::{PointRecord, ScoredPoint};
use std::collections::HashSet;

pub mod hnsw;
pub mod relational;

pub use hnsw::HnswStore;
pub use relational::RelationalStore;

/// Equality / must-not filter applied to every query
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Restrict hits to one profile kind ("user" or "connection")
    pub kind: Option<KindFilter>,
    /// Ids that must never appear in results (the caller and their
    /// existing connections)
    pub exclude_ids: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    User,
    Connection,
}

impl QueryFilter {
    pub fn matches(&self, point: &ScoredPoint) -> bool {
        if self.exclude_ids.contains(&point.id) {
            return false;
        }
        match self.kind {
            Some(KindFilter::User) => point.payload.kind.is_user(),
            Some(KindFilter::Connection) => point.payload.kind.is_connection(),
            None => true,
        }
    }
}

/// Uniform interface over the vector store backends.
///
/// The dimension is fixed at construction and every write is validated
/// against it before anything is stored, so a store can never hold vectors
/// of mixed length.
pub trait VectorStore: Send {
    fn dimensions(&self) -> usize;

    /// Upsert a batch of points keyed by id. Validates every vector's
    /// dimension before writing any of them; re-running the pipeline
    /// overwrites prior vectors safely.
    fn upsert(&mut self, points: Vec<PointRecord>) -> Result<()>;

    /// Ranked similarity query: descending score, every score >= threshold,
    /// filter applied, at most `limit` results.
    fn query(
        &self,
        vector: &[f32],
        filter: &QueryFilter,
        limit: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredPoint>>;

    /// Load a stored point by id (used to fetch the caller's own embedding)
    fn fetch(&self, id: &str) -> Result<Option<PointRecord>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
