/// User interface module
///
/// - The iced application: album list, album detail, view modes (app.rs)
/// - Per-item title edit state (edit.rs)

pub mod app;
pub mod edit;

pub use app::{Message, PhotoAlbums};
pub use edit::EditState;
