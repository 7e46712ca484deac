//! SQLite-backed persistence gateway.
//!
//! Stores:
//! - The quit plan (single row, JSON)
//! - The append-only event log
//! - A key-value table for small pieces of host state (the pending reminder)

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use super::gateway::PersistenceGateway;
use super::{data_dir, migrations};
use crate::error::{CoreError, StorageError};
use crate::log::EventLogEntry;
use crate::plan::PlanConfig;

/// SQLite database for the plan and event log.
///
/// Cloning shares the same connection.
#[derive(Clone)]
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Open the database at `<data_dir>/taper.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("taper.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection mutex poisoned".into()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn kv_delete(&self, key: &str) -> Result<bool, StorageError> {
        let removed = self
            .conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn load_plan(&self) -> Result<Option<PlanConfig>, StorageError> {
        let conn = self.conn()?;
        let result = conn.query_row("SELECT json FROM plan WHERE id = 1", [], |row| {
            row.get::<_, String>(0)
        });
        let json = match result {
            Ok(json) => json,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: "plan".into(),
                message: e.to_string(),
            })
    }

    async fn save_plan(&self, plan: &PlanConfig) -> Result<(), StorageError> {
        let json = serde_json::to_string(plan).map_err(|e| StorageError::Corrupt {
            key: "plan".into(),
            message: e.to_string(),
        })?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO plan (id, json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    async fn append(&self, entry: EventLogEntry) -> Result<(), StorageError> {
        self.conn()?.execute(
            "INSERT INTO events (occurred_at_ms) VALUES (?1)",
            params![entry.occurred_at_ms],
        )?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<EventLogEntry>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT occurred_at_ms FROM events ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(EventLogEntry::at(row?));
        }
        Ok(out)
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        self.conn()?.execute_batch(
            "DELETE FROM plan;
             DELETE FROM events;
             DELETE FROM kv;",
        )?;
        Ok(())
    }
}
