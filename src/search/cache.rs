// Search response cache
//
// Injected cache interface with lazy expiry: staleness is checked at read
// time, nothing sweeps in the background, and stale entries are simply
// overwritten by the next set. Backed by memory or SQLite.

use crate::errors::Result;
use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Normalize a query into its cache key form
pub fn normalize_key(query: &str) -> String {
    query.trim().to_lowercase()
}

pub trait Cache: Send + Sync {
    /// Fresh value for a key, or None when absent or past its TTL
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// In-memory cache, mostly for tests and single-process use
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, chrono::DateTime<Utc>, Duration)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(entries.get(key).and_then(|(value, stored_at, ttl)| {
            if Utc::now() - *stored_at <= *ttl {
                Some(value.clone())
            } else {
                None
            }
        }))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), (value.to_string(), Utc::now(), ttl));
        Ok(())
    }
}

/// SQLite-backed cache shared across processes
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                 key TEXT PRIMARY KEY,
                 value TEXT NOT NULL,
                 stored_at INTEGER NOT NULL,
                 ttl_secs INTEGER NOT NULL
             )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Cache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = conn.query_row(
            "SELECT value, stored_at, ttl_secs FROM cache_entries WHERE key = ?1",
            params![key],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        );

        match result {
            Ok((value, stored_at, ttl_secs)) => {
                let age = Utc::now().timestamp() - stored_at;
                if age <= ttl_secs {
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let conn = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, stored_at, ttl_secs)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key,
                value,
                Utc::now().timestamp(),
                ttl.num_seconds()
            ],
        )?;
        Ok(())
    }
}
