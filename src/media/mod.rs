/// Media module
///
/// This module handles the file input boundary:
/// - Reading image files and sniffing their MIME type (loader.rs)
/// - Turning images into data-URI or object-reference urls (loader.rs)
/// - Recursive folder imports (import.rs)

pub mod import;
pub mod loader;

pub use import::{import_folder, read_images, scan_folder, ImportResult};
pub use loader::{
    decode_data_uri, encode_data_uri, is_image_mime, read_image, resolve_url, to_photo_input,
    LoadedImage, MediaError, ObjectUrlRegistry, UrlStrategy,
};
