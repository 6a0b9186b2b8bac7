use chrono::{Local, Utc};
use uuid::Uuid;

use super::data::{Album, PersistedState, Photo, PhotoInput, ViewMode};
use super::persistence::Persistence;
use super::storage::KeyValueStorage;

/// Handle returned by [`AlbumStore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut()>;

/// The album store: in-memory state plus its persistence.
///
/// Every mutation is replace-then-persist: the in-memory state is updated,
/// the full document is written, then every subscriber is called once in
/// registration order. Mutations that name a missing album or photo change
/// nothing but still persist and notify.
pub struct AlbumStore<S: KeyValueStorage> {
    state: PersistedState,
    persistence: Persistence<S>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStorage> AlbumStore<S> {
    /// Create a store whose initial state is whatever `persistence` loads
    pub fn new(persistence: Persistence<S>) -> Self {
        let state = persistence.load();
        Self {
            state,
            persistence,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ========== Queries ==========

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn albums(&self) -> &[Album] {
        &self.state.albums
    }

    pub fn album(&self, id: &str) -> Option<&Album> {
        self.state.albums.iter().find(|a| a.id == id)
    }

    pub fn photo(&self, album_id: &str, photo_id: &str) -> Option<&Photo> {
        self.album(album_id)?.photo(photo_id)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.state.view_mode
    }

    /// Number of photos across every album
    pub fn photo_count(&self) -> usize {
        self.state.albums.iter().map(|a| a.photos.len()).sum()
    }

    // ========== Subscriptions ==========

    /// Register a callback run after every mutation
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove exactly the callback registered under `id`.
    /// Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    // ========== Mutations ==========

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.state.view_mode = mode;
        self.commit();
    }

    /// Create an empty album at the end of the list.
    /// Without a title, it is named after today's date.
    pub fn create_album(&mut self, title: Option<&str>) -> Album {
        let title = match title {
            Some(title) => title.to_string(),
            None => default_album_title(),
        };

        let album = Album {
            id: new_id(),
            title,
            cover_url: None,
            photos: Vec::new(),
            created_at: Utc::now(),
        };

        tracing::debug!(album_id = %album.id, title = %album.title, "album created");
        self.state.albums.push(album.clone());
        self.commit();
        album
    }

    /// Remove an album and every photo in it
    pub fn delete_album(&mut self, id: &str) {
        self.state.albums.retain(|a| a.id != id);
        self.commit();
    }

    /// Replace an album's title. No validation happens here.
    pub fn update_album_title(&mut self, id: &str, title: &str) {
        if let Some(album) = self.album_mut(id) {
            album.title = title.to_string();
        }
        self.commit();
    }

    /// Append a photo to an album. The first photo of a cover-less album
    /// becomes its cover; an existing cover is never replaced.
    pub fn add_photo_to_album(&mut self, album_id: &str, input: PhotoInput) -> Option<Photo> {
        let added = self.album_mut(album_id).map(|album| {
            let photo = Photo {
                id: new_id(),
                album_id: album.id.clone(),
                url: input.url,
                title: input.title,
                created_at: Utc::now(),
            };

            if album.cover_url.as_deref().map_or(true, str::is_empty) {
                album.cover_url = Some(photo.url.clone());
            }

            album.photos.push(photo.clone());
            photo
        });

        self.commit();
        added
    }

    /// Remove a photo. If it was the cover, the cover moves to the new
    /// first photo, or is cleared when the album is now empty.
    pub fn delete_photo(&mut self, album_id: &str, photo_id: &str) {
        if let Some(album) = self.album_mut(album_id) {
            if let Some(index) = album.photos.iter().position(|p| p.id == photo_id) {
                let removed = album.photos.remove(index);
                if album.cover_url.as_deref() == Some(removed.url.as_str()) {
                    album.cover_url = album.photos.first().map(|p| p.url.clone());
                }
            }
        }
        self.commit();
    }

    pub fn update_photo_title(&mut self, album_id: &str, photo_id: &str, title: &str) {
        if let Some(photo) = self
            .album_mut(album_id)
            .and_then(|album| album.photos.iter_mut().find(|p| p.id == photo_id))
        {
            photo.title = title.to_string();
        }
        self.commit();
    }

    pub fn delete_all_albums(&mut self) {
        self.state.albums.clear();
        self.commit();
    }

    /// Empty an album, clearing its cover
    pub fn delete_all_photos(&mut self, album_id: &str) {
        if let Some(album) = self.album_mut(album_id) {
            album.photos.clear();
            album.cover_url = None;
        }
        self.commit();
    }

    fn album_mut(&mut self, id: &str) -> Option<&mut Album> {
        self.state.albums.iter_mut().find(|a| a.id == id)
    }

    /// Persist the full state, then notify every subscriber
    fn commit(&mut self) {
        self.persistence.save(&self.state);
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
    }
}

impl<S: KeyValueStorage + std::fmt::Debug> std::fmt::Debug for AlbumStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlbumStore")
            .field("state", &self.state)
            .field("persistence", &self.persistence)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// "New album 2024-05-01" using the local date
fn default_album_title() -> String {
    format!("New album {}", Local::now().format("%Y-%m-%d"))
}
