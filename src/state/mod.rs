/// State management module
///
/// This module handles all application state, including:
/// - Key-value storage backends (storage.rs)
/// - Reading/writing the album document (persistence.rs)
/// - Shared data structures (data.rs)
/// - The album store and its subscribers (store.rs)

pub mod data;
pub mod error;
pub mod persistence;
pub mod storage;
pub mod store;

pub use data::{Album, PersistedState, Photo, PhotoInput, ViewMode};
pub use error::StorageError;
pub use persistence::{Persistence, STORAGE_KEY};
pub use storage::{AnyStorage, KeyValueStorage, MemoryStorage, SqliteStorage};
pub use store::{AlbumStore, SubscriptionId};
