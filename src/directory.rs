// Contact Directory
//
// Read access to the contact graph: who the users are, which connections
// exist and who owns them. The recommendation merger and the embedding
// pipeline both consume this through the trait so tests can feed them an
// in-memory graph.

use crate::errors::Result;
use crate::profile::{Profile, ProfileKind};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub trait ContactDirectory: Send {
    /// The user's own profile, if known
    fn user_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Ids of connections already linked to this user
    fn list_connection_ids(&self, user_id: &str) -> Result<Vec<String>>;

    /// Every connection id in the directory
    fn all_connection_ids(&self) -> Result<Vec<String>>;

    /// Every user id in the directory (the "people" recommendation pool)
    fn all_user_ids(&self) -> Result<Vec<String>>;

    fn count_all_connections(&self) -> Result<usize>;

    fn get_connections_by_ids(&self, ids: &[String]) -> Result<Vec<Profile>>;

    /// Every profile, users and connections alike (embedding pipeline input)
    fn all_profiles(&self) -> Result<Vec<Profile>>;
}

/// SQLite-backed directory
pub struct SqliteDirectory {
    conn: Connection,
}

impl SqliteDirectory {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        info!("Opening contact directory at: {}", db_path.as_ref().display());
        let conn = Connection::open(db_path.as_ref())?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contacts (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 email TEXT NOT NULL DEFAULT '',
                 kind TEXT NOT NULL CHECK (kind IN ('user', 'connection')),
                 role TEXT,
                 company TEXT,
                 location TEXT,
                 interests TEXT NOT NULL DEFAULT '[]'
             );
             CREATE TABLE IF NOT EXISTS connection_owners (
                 connection_id TEXT NOT NULL,
                 user_id TEXT NOT NULL,
                 PRIMARY KEY (connection_id, user_id)
             );",
        )?;
        Ok(Self { conn })
    }

    /// Insert or replace a contact row (seeding and CLI import)
    pub fn upsert_contact(&self, profile: &Profile) -> Result<()> {
        let interests = serde_json::to_string(&profile.interests)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO contacts (id, name, email, kind, role, company, location, interests)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                profile.id,
                profile.name,
                profile.email,
                profile.kind.label(),
                profile.role,
                profile.company,
                profile.location,
                interests
            ],
        )?;

        if let ProfileKind::Connection { user_ids } = &profile.kind {
            for user_id in user_ids {
                self.conn.execute(
                    "INSERT OR REPLACE INTO connection_owners (connection_id, user_id)
                     VALUES (?1, ?2)",
                    params![profile.id, user_id],
                )?;
            }
        }
        Ok(())
    }

    /// Link an existing connection to a user
    pub fn add_connection(&self, user_id: &str, connection_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO connection_owners (connection_id, user_id)
             VALUES (?1, ?2)",
            params![connection_id, user_id],
        )?;
        Ok(())
    }

    fn owners_by_connection(&self) -> Result<HashMap<String, Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT connection_id, user_id FROM connection_owners")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut owners: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let (connection_id, user_id) = row?;
            owners.entry(connection_id).or_default().push(user_id);
        }
        Ok(owners)
    }

    fn row_to_profile(
        row: &rusqlite::Row<'_>,
        owners: &HashMap<String, Vec<String>>,
    ) -> rusqlite::Result<Profile> {
        let id: String = row.get(0)?;
        let kind_label: String = row.get(3)?;
        let interests_json: String = row.get(7)?;

        let kind = if kind_label == "user" {
            ProfileKind::User
        } else {
            ProfileKind::Connection {
                user_ids: owners.get(&id).cloned().unwrap_or_default(),
            }
        };

        Ok(Profile {
            id,
            name: row.get(1)?,
            email: row.get(2)?,
            kind,
            role: row.get(4)?,
            company: row.get(5)?,
            location: row.get(6)?,
            interests: serde_json::from_str(&interests_json).unwrap_or_default(),
        })
    }

    fn profiles_where(&self, clause: &str, ids: &[String]) -> Result<Vec<Profile>> {
        let owners = self.owners_by_connection()?;
        let sql = format!(
            "SELECT id, name, email, kind, role, company, location, interests FROM contacts {} ORDER BY id",
            clause
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let params: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(params.as_slice(), |row| Self::row_to_profile(row, &owners))?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    fn ids_where(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

impl ContactDirectory for SqliteDirectory {
    fn user_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let mut profiles = self.profiles_where("WHERE id = ?1", &[user_id.to_string()])?;
        Ok(profiles.pop())
    }

    fn list_connection_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.ids_where(
            "SELECT connection_id FROM connection_owners WHERE user_id = ?1 ORDER BY connection_id",
            params![user_id],
        )
    }

    fn all_connection_ids(&self) -> Result<Vec<String>> {
        self.ids_where(
            "SELECT id FROM contacts WHERE kind = 'connection' ORDER BY id",
            params![],
        )
    }

    fn all_user_ids(&self) -> Result<Vec<String>> {
        self.ids_where("SELECT id FROM contacts WHERE kind = 'user' ORDER BY id", params![])
    }

    fn count_all_connections(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE kind = 'connection'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn get_connections_by_ids(&self, ids: &[String]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
        let clause = format!("WHERE id IN ({})", placeholders.join(", "));
        self.profiles_where(&clause, ids)
    }

    fn all_profiles(&self) -> Result<Vec<Profile>> {
        self.profiles_where("", &[])
    }
}
