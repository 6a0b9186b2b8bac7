use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, scrollable, text, text_input};
use iced::widget::{Column, Image, Row};
use iced::{Alignment, ContentFit, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use super::edit::EditState;
use crate::config::AppConfig;
use crate::media::{self, ImportResult, ObjectUrlRegistry, UrlStrategy};
use crate::state::{Album, AlbumStore, AnyStorage, Persistence, Photo, ViewMode};

/// Extensions offered by the photo picker
const PICKER_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

const GRID_COLUMNS: usize = 4;
const MASONRY_COLUMNS: usize = 3;
const CARD_SIZE: f32 = 160.0;
const LIST_THUMB_SIZE: f32 = 64.0;

/// Main application state
pub struct PhotoAlbums {
    store: AlbumStore<AnyStorage>,
    registry: ObjectUrlRegistry,
    url_strategy: UrlStrategy,
    /// Album being browsed, None for the album list
    open_album: Option<String>,
    /// Title edit state per album/photo id
    edits: HashMap<String, EditState>,
    /// Decoded images keyed by photo url
    thumbnails: HashMap<String, Handle>,
    /// Bumped by the store after every mutation
    revision: Rc<Cell<u64>>,
    seen_revision: u64,
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    SetViewMode(ViewMode),
    CreateAlbum,
    OpenAlbum(String),
    CloseAlbum,
    DeleteAlbum(String),
    DeleteAllAlbums,
    /// Start editing the title of an album or photo (id, current title)
    StartEdit(String, String),
    DraftChanged(String, String),
    CancelEdit(String),
    CommitAlbumTitle(String),
    CommitPhotoTitle { album_id: String, photo_id: String },
    /// User clicked "Add Photos" in an album
    AddPhotos(String),
    /// User clicked "Import Folder" in an album
    ImportFolder(String),
    /// Background file reads completed
    PhotosLoaded(String, ImportResult),
    DeletePhoto { album_id: String, photo_id: String },
    DeleteAllPhotos(String),
}

impl PhotoAlbums {
    /// Create a new instance of the application
    pub fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();
        let store = AlbumStore::new(Persistence::new(config.open_storage()));

        (Self::with_store(store, config.url_strategy), Task::none())
    }

    pub fn with_store(mut store: AlbumStore<AnyStorage>, url_strategy: UrlStrategy) -> Self {
        let revision = Rc::new(Cell::new(0));
        let counter = Rc::clone(&revision);
        store.subscribe(move || counter.set(counter.get() + 1));

        let status = format!(
            "Ready. {} albums, {} photos.",
            store.albums().len(),
            store.photo_count()
        );
        tracing::info!(albums = store.albums().len(), "🎨 photo albums initialized");

        let mut app = PhotoAlbums {
            store,
            registry: ObjectUrlRegistry::new(),
            url_strategy,
            open_album: None,
            edits: HashMap::new(),
            thumbnails: HashMap::new(),
            revision,
            seen_revision: 0,
            status,
        };
        app.refresh_thumbnails();
        app
    }

    /// Handle application messages and update state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.apply(message);

        if self.revision.get() != self.seen_revision {
            self.seen_revision = self.revision.get();
            self.refresh_thumbnails();
        }

        task
    }

    fn apply(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SetViewMode(mode) => self.store.set_view_mode(mode),
            Message::CreateAlbum => {
                let album = self.store.create_album(None);
                self.edits.insert(album.id.clone(), EditState::begin(&album.title));
            }
            Message::OpenAlbum(id) => self.open_album = Some(id),
            Message::CloseAlbum => self.open_album = None,
            Message::DeleteAlbum(id) => {
                if let Some(album) = self.store.album(&id) {
                    for photo in &album.photos {
                        self.registry.revoke(&photo.url);
                        self.edits.remove(&photo.id);
                    }
                }
                self.store.delete_album(&id);
                self.edits.remove(&id);
                if self.open_album.as_deref() == Some(id.as_str()) {
                    self.open_album = None;
                }
            }
            Message::DeleteAllAlbums => {
                for photo in self.store.albums().iter().flat_map(|a| a.photos.iter()) {
                    self.registry.revoke(&photo.url);
                }
                self.store.delete_all_albums();
                self.edits.clear();
                self.open_album = None;
            }
            Message::StartEdit(id, current) => {
                self.edits.insert(id, EditState::begin(&current));
            }
            Message::DraftChanged(id, value) => {
                if let Some(edit) = self.edits.get_mut(&id) {
                    edit.set_draft(value);
                }
            }
            Message::CancelEdit(id) => {
                self.edits.remove(&id);
            }
            Message::CommitAlbumTitle(id) => {
                if let Some(title) = self.edits.remove(&id).and_then(|mut e| e.commit()) {
                    self.store.update_album_title(&id, &title);
                }
            }
            Message::CommitPhotoTitle { album_id, photo_id } => {
                if let Some(title) = self.edits.remove(&photo_id).and_then(|mut e| e.commit()) {
                    self.store.update_photo_title(&album_id, &photo_id, &title);
                }
            }
            Message::AddPhotos(album_id) => {
                let files = FileDialog::new()
                    .set_title("Select Photos")
                    .add_filter("Images", &PICKER_EXTENSIONS)
                    .pick_files();

                if let Some(paths) = files {
                    self.status = format!("Reading {} files...", paths.len());
                    return Task::perform(media::read_images(paths), move |result| {
                        Message::PhotosLoaded(album_id.clone(), result)
                    });
                }
            }
            Message::ImportFolder(album_id) => {
                let folder = FileDialog::new()
                    .set_title("Select Folder with Photos")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    self.status = format!("Importing from {}...", folder_path.display());
                    return Task::perform(media::import_folder(folder_path), move |result| {
                        Message::PhotosLoaded(album_id.clone(), result)
                    });
                }
            }
            Message::PhotosLoaded(album_id, result) => {
                let added = result.images.len();
                for loaded in result.images {
                    let input = media::to_photo_input(loaded, self.url_strategy, &mut self.registry);
                    self.store.add_photo_to_album(&album_id, input);
                }
                self.status = format!(
                    "✅ Added {} photos, skipped {} files.",
                    added, result.skipped_count
                );
            }
            Message::DeletePhoto { album_id, photo_id } => {
                if let Some(photo) = self.store.photo(&album_id, &photo_id) {
                    self.registry.revoke(&photo.url);
                }
                self.store.delete_photo(&album_id, &photo_id);
                self.edits.remove(&photo_id);
            }
            Message::DeleteAllPhotos(album_id) => {
                if let Some(album) = self.store.album(&album_id) {
                    for photo in &album.photos {
                        self.registry.revoke(&photo.url);
                        self.edits.remove(&photo.id);
                    }
                }
                self.store.delete_all_photos(&album_id);
            }
        }

        Task::none()
    }

    /// Decode any new photo urls and forget ones no longer referenced
    fn refresh_thumbnails(&mut self) {
        let mut fresh = HashMap::new();
        for photo in self.store.albums().iter().flat_map(|a| a.photos.iter()) {
            if fresh.contains_key(&photo.url) {
                continue;
            }
            let handle = match self.thumbnails.remove(&photo.url) {
                Some(handle) => Some(handle),
                None => media::resolve_url(&photo.url, &self.registry).map(Handle::from_bytes),
            };
            if let Some(handle) = handle {
                fresh.insert(photo.url.clone(), handle);
            }
        }
        self.thumbnails = fresh;
    }

    /// Build the user interface
    pub fn view(&self) -> Element<'_, Message> {
        let body = match self.open_album.as_deref().and_then(|id| self.store.album(id)) {
            Some(album) => self.album_view(album),
            None => self.library_view(),
        };

        let content = column![self.header(), scrollable(body).height(Length::Fill), text(&self.status).size(14)]
            .spacing(16)
            .padding(24);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn header(&self) -> Element<'_, Message> {
        let current = self.store.view_mode();
        let modes = ViewMode::ALL.iter().fold(row![].spacing(4), |modes, &mode| {
            let label = if mode == current {
                format!("[{mode}]")
            } else {
                mode.to_string()
            };
            modes.push(button(text(label)).on_press(Message::SetViewMode(mode)))
        });

        row![text("Photo Albums").size(32).width(Length::Fill), modes]
            .align_y(Alignment::Center)
            .into()
    }

    fn library_view(&self) -> Element<'_, Message> {
        let actions = row![
            button("New Album").on_press(Message::CreateAlbum).padding(10),
            button("Delete All Albums")
                .on_press_maybe((!self.store.albums().is_empty()).then_some(Message::DeleteAllAlbums))
                .padding(10),
        ]
        .spacing(8);

        let cards = self
            .store
            .albums()
            .iter()
            .map(|album| self.album_card(album))
            .collect();

        column![actions, layout(self.store.view_mode(), cards)]
            .spacing(16)
            .into()
    }

    fn album_view<'a>(&'a self, album: &'a Album) -> Element<'a, Message> {
        let actions = row![
            button("← Albums").on_press(Message::CloseAlbum).padding(10),
            button("Add Photos").on_press(Message::AddPhotos(album.id.clone())).padding(10),
            button("Import Folder").on_press(Message::ImportFolder(album.id.clone())).padding(10),
            button("Delete All Photos")
                .on_press_maybe(
                    (!album.photos.is_empty()).then(|| Message::DeleteAllPhotos(album.id.clone())),
                )
                .padding(10),
        ]
        .spacing(8);

        let title = self.title_field(&album.id, &album.title, Message::CommitAlbumTitle(album.id.clone()));

        let cards = album
            .photos
            .iter()
            .map(|photo| self.photo_card(photo))
            .collect();

        column![actions, title, layout(self.store.view_mode(), cards)]
            .spacing(16)
            .into()
    }

    fn album_card<'a>(&'a self, album: &'a Album) -> Element<'a, Message> {
        let cover = self.thumbnail(album.cover_url.as_deref());
        let title = self.title_field(&album.id, &album.title, Message::CommitAlbumTitle(album.id.clone()));
        let buttons = row![
            button("Open").on_press(Message::OpenAlbum(album.id.clone())),
            button("Delete").on_press(Message::DeleteAlbum(album.id.clone())),
        ]
        .spacing(4);

        self.card(cover, title, text(format!("{} photos", album.photos.len())).size(12).into(), buttons)
    }

    fn photo_card<'a>(&'a self, photo: &'a Photo) -> Element<'a, Message> {
        let preview = self.thumbnail(Some(&photo.url));
        let commit = Message::CommitPhotoTitle {
            album_id: photo.album_id.clone(),
            photo_id: photo.id.clone(),
        };
        let title = self.title_field(&photo.id, &photo.title, commit);
        let added = text(photo.created_at.format("%Y-%m-%d %H:%M").to_string()).size(12);
        let buttons = row![button("Delete").on_press(Message::DeletePhoto {
            album_id: photo.album_id.clone(),
            photo_id: photo.id.clone(),
        })];

        self.card(preview, title, added.into(), buttons)
    }

    /// Lay a card out as a tile (grid/masonry) or a row (list)
    fn card<'a>(
        &self,
        picture: Element<'a, Message>,
        title: Element<'a, Message>,
        detail: Element<'a, Message>,
        buttons: Row<'a, Message>,
    ) -> Element<'a, Message> {
        match self.store.view_mode() {
            ViewMode::List => row![picture, column![title, detail].spacing(4).width(Length::Fill), buttons]
                .spacing(12)
                .align_y(Alignment::Center)
                .into(),
            ViewMode::Grid | ViewMode::Masonry => column![picture, title, detail, buttons]
                .spacing(6)
                .width(Length::Fixed(CARD_SIZE))
                .into(),
        }
    }

    /// A title label, or a text field while the item is being edited
    fn title_field<'a>(&'a self, id: &str, title: &'a str, commit: Message) -> Element<'a, Message> {
        match self.edits.get(id).and_then(EditState::draft) {
            Some(draft) => {
                let item = id.to_string();
                let cancel = id.to_string();
                row![
                    text_input("Title", draft)
                        .on_input(move |value| Message::DraftChanged(item.clone(), value))
                        .on_submit(commit),
                    button("✕").on_press(Message::CancelEdit(cancel)),
                ]
                .spacing(4)
                .into()
            }
            None => button(text(title))
                .style(button::text)
                .on_press(Message::StartEdit(id.to_string(), title.to_string()))
                .into(),
        }
    }

    fn thumbnail(&self, url: Option<&str>) -> Element<'_, Message> {
        let (width, height) = match self.store.view_mode() {
            ViewMode::Grid => (Length::Fixed(CARD_SIZE), Length::Fixed(CARD_SIZE)),
            ViewMode::Masonry => (Length::Fixed(CARD_SIZE), Length::Shrink),
            ViewMode::List => (Length::Fixed(LIST_THUMB_SIZE), Length::Fixed(LIST_THUMB_SIZE)),
        };

        match url.and_then(|url| self.thumbnails.get(url)) {
            Some(handle) => Image::<Handle>::new(handle.clone())
                .width(width)
                .height(height)
                .content_fit(ContentFit::Cover)
                .into(),
            None => {
                let placeholder_height = match height {
                    Length::Shrink => Length::Fixed(CARD_SIZE),
                    other => other,
                };
                container(text("No image").size(12))
                    .width(width)
                    .height(placeholder_height)
                    .center_x(width)
                    .center_y(placeholder_height)
                    .into()
            }
        }
    }
}

/// Arrange cards for the current view mode
fn layout(mode: ViewMode, cards: Vec<Element<'_, Message>>) -> Element<'_, Message> {
    match mode {
        ViewMode::Grid => {
            let mut rows = Column::new().spacing(12);
            let mut cards = cards.into_iter().peekable();
            while cards.peek().is_some() {
                let chunk: Vec<_> = cards.by_ref().take(GRID_COLUMNS).collect();
                rows = rows.push(Row::with_children(chunk).spacing(12));
            }
            rows.into()
        }
        ViewMode::Masonry => {
            let mut columns: Vec<Vec<Element<'_, Message>>> =
                (0..MASONRY_COLUMNS).map(|_| Vec::new()).collect();
            for (index, card) in cards.into_iter().enumerate() {
                columns[index % MASONRY_COLUMNS].push(card);
            }
            Row::with_children(
                columns
                    .into_iter()
                    .map(|cards| Column::with_children(cards).spacing(12).into()),
            )
            .spacing(12)
            .into()
        }
        ViewMode::List => Column::with_children(cards).spacing(8).into(),
    }
}
