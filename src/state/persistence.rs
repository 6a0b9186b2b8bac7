use super::data::PersistedState;
use super::storage::KeyValueStorage;

/// The single key the whole album document lives under
pub const STORAGE_KEY: &str = "photo-albums-state";

/// Reads and writes the album document as one JSON blob.
///
/// Failures never reach the caller: a bad read yields the default state,
/// a bad write is logged and dropped.
#[derive(Debug)]
pub struct Persistence<S> {
    storage: S,
}

impl<S: KeyValueStorage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the stored document, or the default `{ albums: [], viewMode: grid }`
    pub fn load(&self) -> PersistedState {
        let json = match self.storage.get_item(STORAGE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                tracing::debug!(key = STORAGE_KEY, "no saved state, starting empty");
                return PersistedState::default();
            }
            Err(e) => {
                tracing::error!(error = %e, "⚠️  failed to read saved state");
                return PersistedState::default();
            }
        };

        match PersistedState::from_json(&json) {
            Ok(state) => {
                tracing::info!(albums = state.albums.len(), "loaded saved state");
                state
            }
            Err(e) => {
                tracing::error!(error = %e, "⚠️  saved state is corrupt, starting empty");
                PersistedState::default()
            }
        }
    }

    /// Overwrite the stored document with `state`
    pub fn save(&mut self, state: &PersistedState) {
        let json = match state.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "⚠️  failed to serialize state");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(STORAGE_KEY, &json) {
            tracing::error!(error = %e, bytes = json.len(), "⚠️  failed to save state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Album, Photo, ViewMode};
    use crate::state::storage::MemoryStorage;

    fn sample_state() -> PersistedState {
        let created_at = chrono::Utc::now();
        PersistedState {
            albums: vec![Album {
                id: "a1".to_string(),
                title: "Trip".to_string(),
                cover_url: Some("data:image/png;base64,AAAA".to_string()),
                photos: vec![Photo {
                    id: "p1".to_string(),
                    album_id: "a1".to_string(),
                    url: "data:image/png;base64,AAAA".to_string(),
                    title: "Beach".to_string(),
                    created_at,
                }],
                created_at,
            }],
            view_mode: ViewMode::List,
        }
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut persistence = Persistence::new(MemoryStorage::new());
        let state = sample_state();

        persistence.save(&state);

        assert_eq!(persistence.load(), state);
    }

    #[test]
    fn test_missing_key_loads_default() {
        let persistence = Persistence::new(MemoryStorage::new());
        assert_eq!(persistence.load(), PersistedState::default());
    }

    #[test]
    fn test_corrupt_document_loads_default() {
        let mut storage = MemoryStorage::new();
        storage.set_item(STORAGE_KEY, "{not json").unwrap();

        let persistence = Persistence::new(storage);

        assert_eq!(persistence.load(), PersistedState::default());
    }

    #[test]
    fn test_failed_save_is_swallowed() {
        let storage = MemoryStorage::with_quota(16);
        let mut persistence = Persistence::new(storage.clone());

        persistence.save(&sample_state());

        assert_eq!(storage.get_item(STORAGE_KEY).unwrap(), None);
        assert_eq!(persistence.load(), PersistedState::default());
    }

    #[test]
    fn test_offset_less_timestamp_keeps_albums() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                STORAGE_KEY,
                r#"{"albums":[{"id":"a","title":"T","photos":[],"createdAt":"2024-05-01T10:00:00"}],"viewMode":"grid"}"#,
            )
            .unwrap();

        let state = Persistence::new(storage).load();

        assert_eq!(state.albums.len(), 1);
        assert_eq!(state.albums[0].title, "T");
        assert_eq!(
            state.albums[0].created_at,
            "2024-05-01T10:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );
    }
}
