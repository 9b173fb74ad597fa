// Shared test fixtures: deterministic providers, failing doubles and
// profile builders

use crate::embeddings::EmbeddingProvider;
use crate::errors::{Result, RoloError};
use crate::profile::{PointPayload, PointRecord, Profile, ProfileKind, ScoredPoint};
use crate::store::{QueryFilter, VectorStore};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_DIMENSIONS: usize = 8;

/// Deterministic hash-derived embeddings: no network, same text always
/// yields the same vector
pub struct HashProvider {
    dimensions: usize,
    pub batch_calls: AtomicUsize,
}

impl HashProvider {
    pub fn new() -> Self {
        Self {
            dimensions: TEST_DIMENSIONS,
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn hash_vector(text: &str, dimensions: usize) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        let raw: Vec<f32> = (0..dimensions)
            .map(|i| (((hash >> (i % 64)) & 0xff) as f32) + 1.0)
            .collect();
        let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        raw.iter().map(|x| x / norm).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for HashProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::hash_vector(text, self.dimensions))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| Self::hash_vector(t, self.dimensions))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "hash-test"
    }
}

/// Provider that always fails, for batch-fatal behavior
pub struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RoloError::Provider("provider down".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RoloError::Provider("provider down".to_string()))
    }

    fn dimensions(&self) -> usize {
        TEST_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Vector store double whose reads always fail, for degradation paths
pub struct FailingStore;

impl VectorStore for FailingStore {
    fn dimensions(&self) -> usize {
        TEST_DIMENSIONS
    }

    fn upsert(&mut self, _points: Vec<PointRecord>) -> Result<()> {
        Err(RoloError::Store("store down".to_string()))
    }

    fn query(
        &self,
        _vector: &[f32],
        _filter: &QueryFilter,
        _limit: usize,
        _score_threshold: f32,
    ) -> Result<Vec<ScoredPoint>> {
        Err(RoloError::Store("store down".to_string()))
    }

    fn fetch(&self, _id: &str) -> Result<Option<PointRecord>> {
        Err(RoloError::Store("store down".to_string()))
    }

    fn len(&self) -> usize {
        0
    }
}

pub fn user_profile(id: &str, role: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id),
        kind: ProfileKind::User,
        role: Some(role.to_string()),
        company: None,
        location: None,
        interests: Vec::new(),
    }
}

pub fn connection_profile(id: &str, role: &str, owners: &[&str]) -> Profile {
    Profile {
        id: id.to_string(),
        name: format!("Connection {}", id),
        email: format!("{}@example.com", id),
        kind: ProfileKind::Connection {
            user_ids: owners.iter().map(|o| o.to_string()).collect(),
        },
        role: Some(role.to_string()),
        company: None,
        location: None,
        interests: Vec::new(),
    }
}

/// A profile with nothing to embed
pub fn empty_profile(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: format!("Empty {}", id),
        email: String::new(),
        kind: ProfileKind::Connection {
            user_ids: Vec::new(),
        },
        role: None,
        company: Some("   ".to_string()),
        location: None,
        interests: vec!["".to_string(), "  ".to_string()],
    }
}

pub fn point(id: &str, vector: Vec<f32>, kind: ProfileKind) -> PointRecord {
    PointRecord {
        id: id.to_string(),
        vector,
        payload: PointPayload {
            id: id.to_string(),
            name: format!("Point {}", id),
            email: format!("{}@example.com", id),
            kind,
        },
    }
}

/// A unit vector along the given axis
pub fn axis_vector(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; TEST_DIMENSIONS];
    v[axis] = 1.0;
    v
}

/// A vector with the given cosine similarity to `axis_vector(0)`
pub fn vector_with_similarity(similarity: f32) -> Vec<f32> {
    let mut v = vec![0.0; TEST_DIMENSIONS];
    v[0] = similarity;
    v[1] = (1.0 - similarity * similarity).sqrt();
    v
}
