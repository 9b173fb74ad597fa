// Daily search quota
//
// One row per (user, calendar day). The increment is a single atomic
// upsert: the old read-then-write pattern loses updates when the same user
// searches twice concurrently, so the counter bump happens entirely inside
// SQLite.

use crate::errors::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

pub struct QuotaStore {
    conn: Connection,
}

impl QuotaStore {
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
            "CREATE TABLE IF NOT EXISTS search_quota (
                 user_id TEXT NOT NULL,
                 date TEXT NOT NULL,
                 query_count INTEGER NOT NULL DEFAULT 0,
                 PRIMARY KEY (user_id, date)
             )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Today's query count for a user; 0 when no row exists
    pub fn count_today(&self, user_id: &str) -> Result<u32> {
        self.count_on(user_id, Utc::now().date_naive())
    }

    pub fn count_on(&self, user_id: &str, date: NaiveDate) -> Result<u32> {
        let result = self.conn.query_row(
            "SELECT query_count FROM search_quota WHERE user_id = ?1 AND date = ?2",
            params![user_id, date.to_string()],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(count) => Ok(count as u32),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically bump today's count and return the new value.
    ///
    /// `ON CONFLICT .. DO UPDATE SET query_count = query_count + 1` keeps
    /// concurrent increments from losing updates.
    pub fn increment(&self, user_id: &str) -> Result<u32> {
        self.increment_on(user_id, Utc::now().date_naive())
    }

    pub fn increment_on(&self, user_id: &str, date: NaiveDate) -> Result<u32> {
        let count: i64 = self.conn.query_row(
            "INSERT INTO search_quota (user_id, date, query_count)
             VALUES (?1, ?2, 1)
             ON CONFLICT (user_id, date) DO UPDATE SET query_count = query_count + 1
             RETURNING query_count",
            params![user_id, date.to_string()],
            |row| row.get(0),
        )?;

        debug!("Search quota for {} on {}: {}", user_id, date, count);
        Ok(count as u32)
    }
}
