// Core-exposed API
//
// The facade the UI/CLI collaborator talks to. Every call returns a
// structured {success, data | error} shape; errors never cross this
// boundary as panics or raw error types.

use crate::directory::ContactDirectory;
use crate::embeddings::{EmbeddingEngine, EmbeddingProvider};
use crate::errors::Result;
use crate::pipeline::{EmbeddingPipeline, PipelineReport};
use crate::recommend::{RecommendTarget, Recommender, RecommendationPage};
use crate::search::{ExternalSearch, LastQuery, SearchFilters, SearchOutcome};
use crate::store::VectorStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::error;

/// Structured boundary response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    fn from_result(result: Result<T>, context: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                error!("{} failed: {}", context, e);
                Self::err(e)
            }
        }
    }
}

/// The recommendation engine facade
pub struct RoloEngine<P: EmbeddingProvider> {
    pipeline: EmbeddingPipeline<P>,
    recommender: Recommender,
    search: ExternalSearch,
}

impl<P: EmbeddingProvider> RoloEngine<P> {
    pub fn new(
        engine: EmbeddingEngine<P>,
        store: Arc<Mutex<dyn VectorStore>>,
        directory: Arc<Mutex<dyn ContactDirectory>>,
        search: ExternalSearch,
    ) -> Self {
        Self {
            pipeline: EmbeddingPipeline::new(engine, directory.clone(), store.clone()),
            recommender: Recommender::new(store, directory),
            search,
        }
    }

    /// Regenerate and upsert embeddings for all users and connections
    pub async fn run_embedding_pipeline(&self) -> ApiResponse<PipelineReport> {
        ApiResponse::from_result(self.pipeline.run().await, "embedding pipeline")
    }

    /// Paginated recommendations drawn from the connection pool
    pub fn get_recommendations(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> ApiResponse<RecommendationPage> {
        ApiResponse::from_result(
            self.recommender
                .recommend(user_id, RecommendTarget::Connections, limit, offset),
            "recommendations",
        )
    }

    /// Paginated recommendations drawn from the user pool
    pub fn get_people_recommendations(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> ApiResponse<RecommendationPage> {
        ApiResponse::from_result(
            self.recommender
                .recommend(user_id, RecommendTarget::People, limit, offset),
            "people recommendations",
        )
    }

    /// Quota-charged external people search
    pub async fn search_external(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> ApiResponse<SearchOutcome> {
        ApiResponse::from_result(
            self.search.search(user_id, query, limit, filters).await,
            "external search",
        )
    }

    /// Searches the user has left today
    pub fn queries_left(&self, user_id: &str) -> ApiResponse<u32> {
        ApiResponse::from_result(self.search.queries_left(user_id), "quota lookup")
    }

    /// Most recent same-day query and its results, if any
    pub fn last_query_of_day(&self, user_id: &str) -> ApiResponse<Option<LastQuery>> {
        ApiResponse::from_result(self.search.last_query_of_day(user_id), "last query lookup")
    }
}
