// Embeddings Module
//
// Wraps the external embedding provider with single and batch generation.
// Batch mode tolerates per-profile validation failures (the batch continues
// with the rest) but treats a provider failure as fatal for the whole batch:
// no partial results ever reach the vector store.

use crate::errors::{Result, RoloError};
use crate::profile::{composer, Profile};
use tracing::{debug, warn};

pub mod provider;

pub use provider::{EmbeddingProvider, HttpEmbeddingProvider};

/// Default chunk size for provider batch calls. Providers cap batch sizes;
/// chunking internally keeps one logical batch a bounded number of round
/// trips while preserving input order.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Per-profile outcome of a batch generation run.
///
/// The results vector always has the same length and order as the input;
/// invalid profiles occupy their original slot as `Skipped`.
#[derive(Debug, Clone)]
pub enum BatchItem {
    Embedded {
        embedding: Vec<f32>,
        profile_text: String,
    },
    Skipped {
        reason: String,
    },
}

impl BatchItem {
    pub fn is_embedded(&self) -> bool {
        matches!(self, BatchItem::Embedded { .. })
    }
}

/// The embedding engine: validation, composition and provider dispatch
pub struct EmbeddingEngine<P: EmbeddingProvider> {
    provider: P,
    max_batch_size: usize,
}

impl<P: EmbeddingProvider> EmbeddingEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_max_batch_size(provider: P, max_batch_size: usize) -> Self {
        Self {
            provider,
            max_batch_size: max_batch_size.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub(crate) fn provider_ref(&self) -> &P {
        &self.provider
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Generate a single embedding for arbitrary text
    pub async fn generate_one(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RoloError::EmptyInput);
        }

        let vector = self.provider.embed(text).await?;
        if vector.len() != self.provider.dimensions() {
            return Err(RoloError::DimensionMismatch {
                expected: self.provider.dimensions(),
                got: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Generate embeddings for a batch of profiles.
    ///
    /// Invalid profiles are skipped in place with the validation reason;
    /// valid profiles are composed and sent to the provider in order-
    /// preserving chunks. A provider failure aborts the whole batch.
    pub async fn generate_batch(&self, profiles: &[Profile]) -> Result<Vec<BatchItem>> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        // Partition into valid (index + composed text) and invalid (index + reason)
        let mut valid_indices = Vec::new();
        let mut texts = Vec::new();
        let mut results: Vec<Option<BatchItem>> = Vec::with_capacity(profiles.len());

        for (idx, profile) in profiles.iter().enumerate() {
            match composer::validate(profile) {
                Ok(()) => {
                    valid_indices.push(idx);
                    texts.push(composer::compose(profile));
                    results.push(None);
                }
                Err(reason) => {
                    debug!("Skipping profile {} in batch: {}", profile.id, reason);
                    results.push(Some(BatchItem::Skipped { reason }));
                }
            }
        }

        if texts.is_empty() {
            warn!(
                "Batch of {} profiles contained no embeddable entries",
                profiles.len()
            );
            return Ok(results.into_iter().map(|r| r.unwrap()).collect());
        }

        // One provider round trip per chunk; chunk boundaries preserve order
        // so the scatter below maps output i back to valid_indices[i].
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.max_batch_size) {
            let chunk_vectors = self.provider.embed_batch(chunk).await.map_err(|e| {
                RoloError::Provider(format!(
                    "batch embedding failed after {} of {} texts: {}",
                    vectors.len(),
                    texts.len(),
                    e
                ))
            })?;

            if chunk_vectors.len() != chunk.len() {
                return Err(RoloError::Provider(format!(
                    "provider returned {} vectors for {} texts",
                    chunk_vectors.len(),
                    chunk.len()
                )));
            }
            vectors.extend(chunk_vectors);
        }

        let expected = self.provider.dimensions();
        for (i, (idx, vector)) in valid_indices.iter().zip(vectors).enumerate() {
            if vector.len() != expected {
                return Err(RoloError::DimensionMismatch {
                    expected,
                    got: vector.len(),
                });
            }
            results[*idx] = Some(BatchItem::Embedded {
                embedding: vector,
                profile_text: texts[i].clone(),
            });
        }

        debug!(
            "Generated {} embeddings, skipped {} of {} profiles",
            valid_indices.len(),
            profiles.len() - valid_indices.len(),
            profiles.len()
        );

        Ok(results.into_iter().map(|r| r.unwrap()).collect())
    }
}

/// Calculate cosine similarity between two embedding vectors
pub fn cosine_similarity(vec_a: &[f32], vec_b: &[f32]) -> f32 {
    if vec_a.len() != vec_b.len() {
        return 0.0;
    }

    let dot_product: f32 = vec_a.iter().zip(vec_b.iter()).map(|(a, b)| a * b).sum();
    let norm_a: f32 = vec_a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = vec_b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
