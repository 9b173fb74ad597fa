// Embedding Pipeline
//
// Full re-embed over every profile in the directory: compose, batch
// generate, one batched upsert into the vector store. Runs are idempotent;
// upserts are keyed by profile id so a re-run overwrites prior vectors.

use crate::directory::ContactDirectory;
use crate::embeddings::{BatchItem, EmbeddingEngine, EmbeddingProvider};
use crate::errors::Result;
use crate::profile::{PointPayload, PointRecord};
use crate::store::VectorStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Pipeline run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub success: bool,
    /// Unique id for this run, for correlating log lines
    pub run_id: String,
    /// Profiles embedded and upserted this run
    pub embedded: usize,
    /// Profiles skipped for validation reasons
    pub skipped: usize,
    /// Profiles considered
    pub total: usize,
    pub model: String,
    pub dimensions: usize,
}

pub struct EmbeddingPipeline<P: EmbeddingProvider> {
    engine: EmbeddingEngine<P>,
    directory: Arc<Mutex<dyn ContactDirectory>>,
    store: Arc<Mutex<dyn VectorStore>>,
}

impl<P: EmbeddingProvider> EmbeddingPipeline<P> {
    pub fn new(
        engine: EmbeddingEngine<P>,
        directory: Arc<Mutex<dyn ContactDirectory>>,
        store: Arc<Mutex<dyn VectorStore>>,
    ) -> Self {
        Self {
            engine,
            directory,
            store,
        }
    }

    pub fn engine(&self) -> &EmbeddingEngine<P> {
        &self.engine
    }

    /// Regenerate and upsert embeddings for all users and connections.
    ///
    /// Per-profile validation failures are logged and skipped; a provider
    /// failure aborts the run before anything is written.
    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let profiles = {
            let directory = match self.directory.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            directory.all_profiles()?
        };

        info!(
            "Embedding pipeline {} starting over {} profiles",
            run_id,
            profiles.len()
        );

        let items = self.engine.generate_batch(&profiles).await?;

        let mut points = Vec::new();
        let mut skipped = 0usize;
        for (profile, item) in profiles.iter().zip(items) {
            match item {
                BatchItem::Embedded { embedding, .. } => {
                    points.push(PointRecord {
                        id: profile.id.clone(),
                        vector: embedding,
                        payload: PointPayload::from_profile(profile),
                    });
                }
                BatchItem::Skipped { reason } => {
                    warn!("Pipeline skipping {}: {}", profile.id, reason);
                    skipped += 1;
                }
            }
        }

        let embedded = points.len();
        if !points.is_empty() {
            let mut store = match self.store.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            store.upsert(points)?;
        }

        info!(
            "Embedding pipeline {} finished: {} embedded, {} skipped of {}",
            run_id,
            embedded,
            skipped,
            profiles.len()
        );

        Ok(PipelineReport {
            success: true,
            run_id,
            embedded,
            skipped,
            total: profiles.len(),
            model: self.engine.model_name().to_string(),
            dimensions: self.engine.dimensions(),
        })
    }
}
