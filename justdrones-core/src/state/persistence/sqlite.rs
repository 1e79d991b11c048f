use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::{schema, KeyValueStore, StoreError, StoreResult};

/// Settings kept in a single SQLite table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        schema::create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError("settings connection lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get_number(&self, key: &str) -> StoreResult<Option<f64>> {
        let conn = self.conn()?;
        let value: Option<Option<f64>> = conn
            .query_row(
                "SELECT number FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn set_number(&self, key: &str, value: f64) -> StoreResult {
        self.conn()?.execute(
            "INSERT INTO settings (key, number, blob) VALUES (?1, ?2, NULL)
             ON CONFLICT(key) DO UPDATE SET number = excluded.number, blob = NULL",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_blob(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let value: Option<Option<Vec<u8>>> = conn
            .query_row(
                "SELECT blob FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn set_blob(&self, key: &str, value: &[u8]) -> StoreResult {
        self.conn()?.execute(
            "INSERT INTO settings (key, number, blob) VALUES (?1, NULL, ?2)
             ON CONFLICT(key) DO UPDATE SET blob = excluded.blob, number = NULL",
            params![key, value],
        )?;
        Ok(())
    }
}
