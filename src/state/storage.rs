use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::error::StorageError;

/// A string-keyed, string-valued store.
///
/// This is the desktop stand-in for a browser's local storage: one origin,
/// a handful of keys, whole values read and written at once.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage.
///
/// Clones share the same underlying map, so two handles behave like two
/// windows open on the same origin.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys + values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Rc::default(),
            quota: Some(bytes),
        }
    }

    /// Total bytes currently held (keys + values)
    pub fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let existing = self
                .items
                .borrow()
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - existing + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// SQLite-backed storage: a single `kv` table in a database file.
pub struct SqliteStorage {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Open the database in the user's data directory:
    /// - Linux: ~/.local/share/photo-albums/photo_albums.db
    /// - macOS: ~/Library/Application Support/photo-albums/photo_albums.db
    /// - Windows: %APPDATA%\photo-albums\photo_albums.db
    pub fn open_default() -> Result<Self, StorageError> {
        let db_path = Self::default_db_path().ok_or(StorageError::NoDataDir)?;
        Self::open(db_path)
    }

    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = path.as_ref().to_path_buf();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "📁 storage opened");

        let storage = SqliteStorage {
            conn,
            db_path: Some(db_path),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// A throwaway database that lives only as long as this value
    pub fn in_memory() -> Result<Self, StorageError> {
        let storage = SqliteStorage {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Get the path where the database should be stored
    pub fn default_db_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("photo-albums");
        path.push("photo_albums.db");
        Some(path)
    }

    /// Get the path to the database file (None for in-memory databases)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Either backend, chosen at startup from the config
#[derive(Debug)]
pub enum AnyStorage {
    Memory(MemoryStorage),
    Sqlite(SqliteStorage),
}

impl KeyValueStorage for AnyStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            AnyStorage::Memory(s) => s.get_item(key),
            AnyStorage::Sqlite(s) => s.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            AnyStorage::Memory(s) => s.set_item(key, value),
            AnyStorage::Sqlite(s) => s.set_item(key, value),
        }
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match self {
            AnyStorage::Memory(s) => s.remove_item(key),
            AnyStorage::Sqlite(s) => s.remove_item(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip_and_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_memory_clones_share_items() {
        let mut first = MemoryStorage::new();
        let second = first.clone();

        first.set_item("k", "v").unwrap();

        assert_eq!(second.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_quota_rejects_oversized_write() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("k", "12345").unwrap();

        let err = storage.set_item("k", "1234567890").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 11, quota: 10 }));

        // The previous value is untouched
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn test_memory_quota_counts_replaced_value_once() {
        let mut storage = MemoryStorage::with_quota(6);
        storage.set_item("k", "abcde").unwrap();
        storage.set_item("k", "vwxyz").unwrap();
        assert_eq!(storage.used_bytes(), 6);
    }

    #[test]
    fn test_sqlite_upsert_and_remove() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("albums.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            assert_eq!(storage.path(), Some(path.as_path()));
            storage.set_item("k", "kept").unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("kept"));
    }
}
