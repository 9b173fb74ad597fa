// Relational backend
//
// SQLite-backed store exposing the same interface as the ANN index. The
// underlying "nearest documents" query returns a broad, unfiltered
// candidate set; filtering, threshold and limiting happen in process so the
// caller sees exactly what the HNSW backend would return.

use super::{QueryFilter, VectorStore};
use crate::embeddings::cosine_similarity;
use crate::errors::{Result, RoloError};
use crate::profile::{PointPayload, PointRecord, ScoredPoint};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info, warn};

/// Floor for the nearest-documents candidate pull. The relational query
/// cannot filter by kind or exclusion, so it over-fetches and lets the
/// adapter narrow the set down.
const MIN_MATCH_COUNT: usize = 200;

pub struct RelationalStore {
    conn: Connection,
    dimensions: usize,
}

impl RelationalStore {
    pub fn open<P: AsRef<Path>>(db_path: P, dimensions: usize) -> Result<Self> {
        info!(
            "Opening relational vector store at: {}",
            db_path.as_ref().display()
        );
        let conn = Connection::open(db_path.as_ref())?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;
        Self::from_connection(conn, dimensions)
    }

    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, dimensions)
    }

    fn from_connection(conn: Connection, dimensions: usize) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS points (
                 id TEXT PRIMARY KEY,
                 dimensions INTEGER NOT NULL,
                 vector BLOB NOT NULL,
                 payload TEXT NOT NULL,
                 updated_at INTEGER NOT NULL
             )",
            [],
        )?;
        Ok(Self { conn, dimensions })
    }

    /// The relational "nearest documents" procedure: scores every stored
    /// vector against the query and returns the top `match_count` with no
    /// kind or exclusion filtering applied.
    fn nearest_documents(&self, vector: &[f32], match_count: usize) -> Result<Vec<ScoredPoint>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, vector, payload FROM points")?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            let payload: String = row.get(2)?;
            Ok((id, bytes, payload))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            let (id, bytes, payload_json) = row?;
            let stored = decode_vector(&bytes);
            let payload: PointPayload = serde_json::from_str(&payload_json)?;
            candidates.push(ScoredPoint {
                id,
                score: cosine_similarity(vector, &stored),
                payload,
            });
        }

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        candidates.truncate(match_count);
        Ok(candidates)
    }
}

impl VectorStore for RelationalStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn upsert(&mut self, points: Vec<PointRecord>) -> Result<()> {
        // Validate the whole batch before writing anything
        for point in &points {
            if point.vector.len() != self.dimensions {
                return Err(RoloError::DimensionMismatch {
                    expected: self.dimensions,
                    got: point.vector.len(),
                });
            }
        }

        let now = chrono::Utc::now().timestamp();
        let count = points.len();

        // One transaction: either the whole batch lands or none of it does
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO points (id, dimensions, vector, payload, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for point in points {
                let bytes = encode_vector(&point.vector);
                let payload = serde_json::to_string(&point.payload)?;
                stmt.execute(params![
                    point.id,
                    self.dimensions as i64,
                    bytes,
                    payload,
                    now
                ])?;
            }
        }
        tx.commit()?;

        debug!("Upserted {} points into relational store", count);
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

        if limit == 0 {
            return Ok(Vec::new());
        }

        let match_count = (limit + filter.exclude_ids.len())
            .saturating_mul(4)
            .max(MIN_MATCH_COUNT);
        let candidates = self.nearest_documents(vector, match_count)?;

        // In-process filtering over the broad candidate set
        let mut results: Vec<ScoredPoint> = candidates
            .into_iter()
            .filter(|c| c.score >= score_threshold)
            .filter(|c| filter.matches(c))
            .collect();
        results.truncate(limit);
        Ok(results)
    }

    fn fetch(&self, id: &str) -> Result<Option<PointRecord>> {
        let result = self.conn.query_row(
            "SELECT vector, payload FROM points WHERE id = ?1",
            params![id],
            |row| {
                let bytes: Vec<u8> = row.get(0)?;
                let payload: String = row.get(1)?;
                Ok((bytes, payload))
            },
        );

        match result {
            Ok((bytes, payload_json)) => {
                let payload: PointPayload = serde_json::from_str(&payload_json)?;
                Ok(Some(PointRecord {
                    id: id.to_string(),
                    vector: decode_vector(&bytes),
                    payload,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn len(&self) -> usize {
        match self
            .conn
            .query_row("SELECT COUNT(*) FROM points", [], |row| row.get::<_, i64>(0))
        {
            Ok(count) => count as usize,
            Err(e) => {
                warn!("Point count query failed, reporting empty store: {}", e);
                0
            }
        }
    }
}

/// Serialize an f32 vector to little-endian bytes for BLOB storage
fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
