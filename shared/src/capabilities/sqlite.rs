use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::kv::{KvError, KvStorage, StorageErrorCode};

impl From<rusqlite::Error> for KvError {
    fn from(e: rusqlite::Error) -> Self {
        let code = match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                StorageErrorCode::Busy
            }
            Some(rusqlite::ErrorCode::DiskFull) => StorageErrorCode::DiskFull,
            Some(rusqlite::ErrorCode::PermissionDenied | rusqlite::ErrorCode::ReadOnly) => {
                StorageErrorCode::PermissionDenied
            }
            Some(rusqlite::ErrorCode::DatabaseCorrupt | rusqlite::ErrorCode::NotADatabase) => {
                StorageErrorCode::Corrupted
            }
            Some(_) => StorageErrorCode::IoError,
            None => StorageErrorCode::Unknown,
        };
        KvError::storage(code, e.to_string())
    }
}

/// SQLite-backed key-value table for native shells.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let conn = Connection::open(path)?;
        Self::migrate(conn)
    }

    pub fn new_in_memory() -> Result<Self, KvError> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(conn)
    }

    fn migrate(conn: Connection) -> Result<Self, KvError> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }
}

impl KvStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.conn.execute(
            r"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, KvError> {
        let affected = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    fn clear(&mut self) -> Result<(), KvError> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}
