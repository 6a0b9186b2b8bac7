/// Application configuration
///
/// Read once at startup from `<config_dir>/photo-albums/config.json`.
/// Every field is optional; a missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::media::UrlStrategy;
use crate::state::{AnyStorage, MemoryStorage, SqliteStorage};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which key-value backend holds the album document
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    /// Nothing survives a restart
    Memory,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageKind,
    /// Overrides the database location in the user data directory
    pub database_path: Option<PathBuf>,
    /// How new photos are turned into urls
    pub url_strategy: UrlStrategy,
}

impl AppConfig {
    /// Get the path where the config file is expected
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("photo-albums");
        path.push("config.json");
        Some(path)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load from the default location, falling back to defaults on any error
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "⚠️  using default config");
                Self::default()
            }
        }
    }

    /// Open the configured storage backend.
    /// If the database cannot be opened, storage falls back to memory.
    pub fn open_storage(&self) -> AnyStorage {
        if self.storage == StorageKind::Memory {
            return AnyStorage::Memory(MemoryStorage::new());
        }

        let opened = match &self.database_path {
            Some(path) => SqliteStorage::open(path),
            None => SqliteStorage::open_default(),
        };

        match opened {
            Ok(storage) => AnyStorage::Sqlite(storage),
            Err(e) => {
                tracing::error!(error = %e, "⚠️  database unavailable, albums will not be saved");
                AnyStorage::Memory(MemoryStorage::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::KeyValueStorage;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "url_strategy": "object_reference" }"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();

        assert_eq!(config.url_strategy, UrlStrategy::ObjectReference);
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.database_path, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "storage = sqlite").unwrap();

        assert!(matches!(AppConfig::from_file(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_open_configured_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: Some(dir.path().join("albums.db")),
            ..AppConfig::default()
        };

        let mut storage = config.open_storage();
        assert!(matches!(storage, AnyStorage::Sqlite(_)));
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_open_memory() {
        let config = AppConfig {
            storage: StorageKind::Memory,
            ..AppConfig::default()
        };
        assert!(matches!(config.open_storage(), AnyStorage::Memory(_)));
    }
}
