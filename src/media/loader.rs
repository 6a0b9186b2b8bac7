/// Image file loading for the file input boundary
///
/// Files become photo urls in one of two ways:
/// - a `data:` URI embedding the bytes, which survives a restart
/// - a `blob:` object reference into an in-process registry, which does not

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::state::data::PhotoInput;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not an image")]
    NotAnImage(String),
}

/// An image file read into memory
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// File stem, used as the initial photo title
    pub title: String,
    /// Always starts with `image/`
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// How a loaded image is turned into a photo url
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStrategy {
    /// Embed the bytes; the url stays valid after a reload
    #[default]
    DataUri,
    /// Register the bytes in memory; the url dies with the process
    ObjectReference,
}

/// True for MIME types accepted by the file input (`image/*`)
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Sniff an image MIME type from the file contents
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
        .filter(|mime| is_image_mime(mime))
}

/// Read an image file from disk.
/// Files whose contents are not a recognizable image are rejected.
pub async fn read_image(path: impl AsRef<Path>) -> Result<LoadedImage, MediaError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let bytes = tokio::fs::read(path).await.map_err(|source| MediaError::Io {
        path: display.clone(),
        source,
    })?;

    let mime = sniff_mime(&bytes).ok_or_else(|| MediaError::NotAnImage(display.clone()))?;

    let title = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(LoadedImage {
        title,
        mime: mime.to_string(),
        bytes,
    })
}

/// Encode bytes as `data:<mime>;base64,<payload>`
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URI back into its MIME type and bytes
pub fn decode_data_uri(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

/// In-process table of `blob:` urls.
/// Nothing here is persisted; urls handed out are dead after a restart.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    objects: HashMap<String, (String, Vec<u8>)>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mime: &str, bytes: Vec<u8>) -> String {
        let url = format!("blob:{}", Uuid::new_v4());
        self.objects.insert(url.clone(), (mime.to_string(), bytes));
        url
    }

    pub fn resolve(&self, url: &str) -> Option<&[u8]> {
        self.objects.get(url).map(|(_, bytes)| bytes.as_slice())
    }

    /// Release a url. Returns false if it was unknown.
    pub fn revoke(&mut self, url: &str) -> bool {
        self.objects.remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Turn a loaded image into the `{url, title}` pair the store accepts
pub fn to_photo_input(
    image: LoadedImage,
    strategy: UrlStrategy,
    registry: &mut ObjectUrlRegistry,
) -> PhotoInput {
    let url = match strategy {
        UrlStrategy::DataUri => encode_data_uri(&image.mime, &image.bytes),
        UrlStrategy::ObjectReference => registry.register(&image.mime, image.bytes),
    };
    PhotoInput::new(url, image.title)
}

/// Bytes behind a photo url, if they are still reachable
pub fn resolve_url(url: &str, registry: &ObjectUrlRegistry) -> Option<Vec<u8>> {
    if url.starts_with("data:") {
        decode_data_uri(url).map(|(_, bytes)| bytes)
    } else {
        registry.resolve(url).map(<[u8]>::to_vec)
    }
}
