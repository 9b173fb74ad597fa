// External People Search
//
// Quota-tracked wrapper around a third-party people-search API. Every
// search attempt charges the daily quota before anything else happens, so a
// rejected call still counts (documented source behavior). Successful
// responses land in the injected cache under the normalized query key, plus
// a last-query-of-the-day entry for same-day UI continuity.

use crate::errors::{Result, RoloError};
use crate::search::cache::{normalize_key, Cache};
use crate::search::quota::QuotaStore;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub mod cache;
pub mod quota;

/// Default max age for cached search responses
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Optional narrowing filters passed through to the search API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub school: Vec<String>,
    #[serde(default)]
    pub company: Vec<String>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

/// A profile returned by the external search API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
}

/// Third-party people-search endpoint
#[async_trait]
pub trait PeopleSearchApi: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<ExternalProfile>>;
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub(crate) query: &'a str,
    pub(crate) limit: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) school: &'a Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) company: &'a Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ExternalProfile>,
}

/// reqwest client for the hosted people-search service
pub struct HttpPeopleSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpPeopleSearch {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl PeopleSearchApi for HttpPeopleSearch {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<ExternalProfile>> {
        let request = SearchRequest {
            query,
            limit,
            school: &filters.school,
            company: &filters.company,
            threshold: filters.threshold,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoloError::Provider(format!(
                "people-search API returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RoloError::Provider(format!("malformed search response: {}", e)))?;
        Ok(parsed.results)
    }
}

/// The most recent query of the day, restored for UI continuity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastQuery {
    pub query: String,
    pub results: Vec<ExternalProfile>,
}

/// Outcome of a quota-charged search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<ExternalProfile>,
    pub queries_left: u32,
    pub from_cache: bool,
}

/// Quota + cache orchestration around the search API
pub struct ExternalSearch {
    api: Arc<dyn PeopleSearchApi>,
    quota: Mutex<QuotaStore>,
    cache: Arc<dyn Cache>,
    daily_limit: u32,
    cache_ttl: Duration,
}

impl ExternalSearch {
    pub fn new(
        api: Arc<dyn PeopleSearchApi>,
        quota: QuotaStore,
        cache: Arc<dyn Cache>,
        daily_limit: u32,
    ) -> Self {
        Self {
            api,
            quota: Mutex::new(quota),
            cache,
            daily_limit,
            cache_ttl: Duration::hours(DEFAULT_CACHE_TTL_HOURS),
        }
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    fn quota_store(&self) -> std::sync::MutexGuard<'_, QuotaStore> {
        match self.quota.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// How many searches the user has left today
    pub fn queries_left(&self, user_id: &str) -> Result<u32> {
        let used = self.quota_store().count_today(user_id)?;
        Ok(self.daily_limit.saturating_sub(used))
    }

    /// Today's query count for a user (0 when they have not searched)
    pub fn query_count(&self, user_id: &str) -> Result<u32> {
        self.quota_store().count_today(user_id)
    }

    /// Run a quota-charged search.
    ///
    /// The increment happens before the limit check and before the external
    /// call, so the call is only ever issued once the charge is recorded.
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome> {
        let used = self.quota_store().increment(user_id)?;
        if used > self.daily_limit {
            return Err(RoloError::QuotaExceeded {
                used,
                limit: self.daily_limit,
            });
        }
        let queries_left = self.daily_limit.saturating_sub(used);

        let cache_key = format!("search:{}", normalize_key(query));
        if let Some(cached) = self.cache.get(&cache_key)? {
            let results: Vec<ExternalProfile> = serde_json::from_str(&cached)?;
            debug!("Search cache hit for {:?} ({} results)", query, results.len());
            self.record_last_query(user_id, query, &results)?;
            return Ok(SearchOutcome {
                results,
                queries_left,
                from_cache: true,
            });
        }

        let results = self.api.search(query, limit, filters).await?;
        info!(
            "External search for {:?} returned {} results ({} queries left for {})",
            query,
            results.len(),
            queries_left,
            user_id
        );

        self.cache
            .set(&cache_key, &serde_json::to_string(&results)?, self.cache_ttl)?;
        self.record_last_query(user_id, query, &results)?;

        Ok(SearchOutcome {
            results,
            queries_left,
            from_cache: false,
        })
    }

    /// Restore the most recent same-day query and its results
    pub fn last_query_of_day(&self, user_id: &str) -> Result<Option<LastQuery>> {
        let key = Self::last_query_key(user_id);
        match self.cache.get(&key)? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    fn record_last_query(
        &self,
        user_id: &str,
        query: &str,
        results: &[ExternalProfile],
    ) -> Result<()> {
        let entry = LastQuery {
            query: query.to_string(),
            results: results.to_vec(),
        };
        self.cache.set(
            &Self::last_query_key(user_id),
            &serde_json::to_string(&entry)?,
            self.cache_ttl,
        )
    }

    /// Keyed by calendar date so yesterday's entry goes stale on its own
    fn last_query_key(user_id: &str) -> String {
        format!("last_query:{}:{}", user_id, Utc::now().date_naive())
    }
}
