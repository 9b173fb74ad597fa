// Cache behavior: lazy expiry, key normalization

#[cfg(test)]
mod cache_tests {
    use crate::search::cache::{normalize_key, Cache, MemoryCache, SqliteCache};
    use chrono::Duration;

    fn caches() -> Vec<Box<dyn Cache>> {
        vec![
            Box::new(MemoryCache::new()),
            Box::new(SqliteCache::open_in_memory().unwrap()),
        ]
    }

    #[test]
    fn fresh_entries_are_returned() {
        for cache in caches() {
            cache.set("k", "value", Duration::hours(1)).unwrap();
            assert_eq!(cache.get("k").unwrap().as_deref(), Some("value"));
        }
    }

    #[test]
    fn missing_keys_return_none() {
        for cache in caches() {
            assert!(cache.get("absent").unwrap().is_none());
        }
    }

    #[test]
    fn expired_entries_are_stale_at_read_time() {
        for cache in caches() {
            // Negative TTL: already expired the moment it was stored
            cache.set("k", "value", Duration::seconds(-1)).unwrap();
            assert!(cache.get("k").unwrap().is_none());
        }
    }

    #[test]
    fn set_overwrites_stale_entries() {
        for cache in caches() {
            cache.set("k", "old", Duration::seconds(-1)).unwrap();
            cache.set("k", "new", Duration::hours(1)).unwrap();
            assert_eq!(cache.get("k").unwrap().as_deref(), Some("new"));
        }
    }

    #[test]
    fn normalize_key_trims_and_lowercases() {
        assert_eq!(normalize_key("  Jane Doe  "), "jane doe");
        assert_eq!(normalize_key("ENGINEER"), "engineer");
        assert_eq!(normalize_key("already clean"), "already clean");
    }
}
