// Quota-charged external search: limit enforcement, response caching,
// same-day query restore

#[cfg(test)]
mod external_search_tests {
    use crate::errors::{Result, RoloError};
    use crate::search::cache::MemoryCache;
    use crate::search::quota::QuotaStore;
    use crate::search::{
        ExternalSearch, ExternalProfile, PeopleSearchApi, SearchFilters, SearchRequest,
    };
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubApi {
        calls: AtomicUsize,
    }

    impl StubApi {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PeopleSearchApi for StubApi {
        async fn search(
            &self,
            query: &str,
            limit: usize,
            _filters: &SearchFilters,
        ) -> Result<Vec<ExternalProfile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..limit.min(2))
                .map(|i| ExternalProfile {
                    name: format!("{} match {}", query, i),
                    title: Some("Engineer".to_string()),
                    company: None,
                    location: None,
                    profile_url: None,
                })
                .collect())
        }
    }

    fn search_with_limit(api: Arc<StubApi>, daily_limit: u32) -> ExternalSearch {
        ExternalSearch::new(
            api,
            QuotaStore::open_in_memory().unwrap(),
            Arc::new(MemoryCache::new()),
            daily_limit,
        )
    }

    #[tokio::test]
    async fn search_returns_results_and_decrements_quota() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 3);

        let outcome = search
            .search("u1", "jane doe", 10, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.queries_left, 2);
        assert!(!outcome.from_cache);
        assert_eq!(search.queries_left("u1").unwrap(), 2);
    }

    #[tokio::test]
    async fn exceeding_the_daily_limit_rejects_without_calling_the_api() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 1);

        search
            .search("u1", "first", 10, &SearchFilters::default())
            .await
            .unwrap();

        let err = search
            .search("u1", "second", 10, &SearchFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RoloError::QuotaExceeded { used: 2, limit: 1 }
        ));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1, "search never issued");
    }

    #[tokio::test]
    async fn rejected_search_still_consumes_quota() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 1);

        search
            .search("u1", "first", 10, &SearchFilters::default())
            .await
            .unwrap();
        let _ = search
            .search("u1", "second", 10, &SearchFilters::default())
            .await;

        // The rejected attempt charged the counter anyway
        assert_eq!(search.query_count("u1").unwrap(), 2);
        assert_eq!(search.queries_left("u1").unwrap(), 0);
    }

    #[tokio::test]
    async fn repeated_queries_are_served_from_cache() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 10);

        let first = search
            .search("u1", "Jane Doe", 10, &SearchFilters::default())
            .await
            .unwrap();
        // Normalized key: case and surrounding whitespace don't matter
        let second = search
            .search("u1", "  jane doe ", 10, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.results, second.results);
    }

    #[tokio::test]
    async fn cache_hits_still_charge_quota() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 10);

        search
            .search("u1", "jane", 10, &SearchFilters::default())
            .await
            .unwrap();
        search
            .search("u1", "jane", 10, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(search.query_count("u1").unwrap(), 2);
    }

    #[tokio::test]
    async fn last_query_of_day_restores_most_recent_search() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 10);

        assert!(search.last_query_of_day("u1").unwrap().is_none());

        search
            .search("u1", "older query", 10, &SearchFilters::default())
            .await
            .unwrap();
        search
            .search("u1", "newer query", 10, &SearchFilters::default())
            .await
            .unwrap();

        let last = search.last_query_of_day("u1").unwrap().unwrap();
        assert_eq!(last.query, "newer query");
        assert_eq!(last.results.len(), 2);
    }

    #[test]
    fn request_body_omits_empty_filter_lists() {
        let school = vec!["MIT".to_string()];
        let company: Vec<String> = Vec::new();
        let body = serde_json::to_value(SearchRequest {
            query: "jane",
            limit: 5,
            school: &school,
            company: &company,
            threshold: None,
        })
        .unwrap();

        assert_eq!(body["query"], "jane");
        assert_eq!(body["school"][0], "MIT");
        assert!(body.get("company").is_none());
        assert!(body.get("threshold").is_none());
    }

    #[tokio::test]
    async fn last_query_entry_honors_the_configured_ttl() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 10).with_cache_ttl(Duration::seconds(-1));

        search
            .search("u1", "jane", 10, &SearchFilters::default())
            .await
            .unwrap();

        // An already-expired entry must not be restored
        assert!(search.last_query_of_day("u1").unwrap().is_none());
    }

    #[tokio::test]
    async fn quota_is_tracked_per_user() {
        let api = StubApi::new();
        let search = search_with_limit(api.clone(), 2);

        search
            .search("u1", "a", 10, &SearchFilters::default())
            .await
            .unwrap();
        search
            .search("u1", "b", 10, &SearchFilters::default())
            .await
            .unwrap();

        // u1 exhausted, u2 untouched
        assert!(search
            .search("u1", "c", 10, &SearchFilters::default())
            .await
            .is_err());
        assert!(search
            .search("u2", "c", 10, &SearchFilters::default())
            .await
            .is_ok());
    }
}
