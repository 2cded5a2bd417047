pub mod migrations;
pub mod schools;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::{debug, info};

use schools_core::{NewSchool, School};

use crate::{Backend, SchoolStore};

/// Open or create the SQLite database at the given path.
///
/// Sets WAL journal mode and creates parent directories if needed.
pub fn open_or_create(path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                Some(format!("Cannot create directory {}: {}", parent.display(), e)),
            )
        })?;
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Returns the default database path: `~/.local/share/schools/schools.db`
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("schools").join("schools.db"))
}

/// Open a private in-memory database with migrations applied.
pub fn open_migrated_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::migrate(&conn)?;
    Ok(conn)
}

/// Create an in-memory database with migrations applied, for testing.
#[cfg(test)]
pub fn test_db() -> Connection {
    open_migrated_in_memory().expect("open migrated in-memory db")
}

/// SQLite-backed store. One connection, serialized behind an async mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_or_create(path)
            .with_context(|| format!("failed to open database: {}", path.display()))?;
        migrations::migrate(&conn).context("failed to migrate schools table")?;
        info!(path = %path.display(), "SQLite database ready");
        Ok(Self::from_connection(conn))
    }

    /// A fresh private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = open_migrated_in_memory().context("failed to open in-memory database")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl SchoolStore for SqliteStore {
    async fn fetch_all(&self) -> Result<Vec<School>> {
        let conn = self.conn.lock().await;
        let schools = schools::list(&conn).context("failed to list schools")?;
        debug!(count = schools.len(), "fetched schools from SQLite");
        Ok(schools)
    }

    async fn insert(&self, school: NewSchool) -> Result<School> {
        let conn = self.conn.lock().await;
        schools::insert(&conn, &school).context("failed to insert school")
    }

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schools_core::parse_new_school;
    use serde_json::json;

    #[test]
    fn test_open_or_create_creates_db() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("subdir").join("test.db");

        let conn = open_or_create(&db_path).expect("open_or_create should succeed");

        assert!(db_path.exists());

        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_default_db_path_ends_correctly() {
        if let Some(path) = default_db_path() {
            assert!(path.ends_with("schools/schools.db"));
        }
    }

    #[tokio::test]
    async fn test_store_round_trip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("schools.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            let school = parse_new_school(&json!({
                "name": "Lincoln",
                "address": "1 Main St",
                "latitude": 40.7128,
                "longitude": -74.0060,
            }))
            .unwrap();
            store.insert(school).await.unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let schools = store.fetch_all().await.unwrap();
        assert_eq!(schools.len(), 1);
        assert_eq!(schools[0].name, "Lincoln");
        assert_eq!(store.backend(), Backend::Sqlite);
    }

    #[test]
    fn test_migrated_in_memory_has_schools_table() {
        let conn = open_migrated_in_memory().unwrap();
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
        assert!(schools::list(&conn).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_store_starts_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());
    }
}
