use photo_albums::ui::PhotoAlbums;
use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    iced::application("Photo Albums", PhotoAlbums::update, PhotoAlbums::view)
        .theme(PhotoAlbums::theme)
        .centered()
        .run_with(PhotoAlbums::new)
}
