use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::loader::{read_image, LoadedImage};

/// File extensions considered when scanning a folder
const IMAGE_EXTENSIONS: [&str; 11] = [
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "avif", "ico", "qoi",
];

/// Result of a folder import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub images: Vec<LoadedImage>,
    /// Files with an image extension that could not be read as an image
    pub skipped_count: usize,
}

/// Recursively list files with an image extension, sorted by path
pub fn scan_folder(folder: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| has_image_extension(path))
        .collect();

    paths.sort();
    paths
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Read every image below `folder`
pub async fn import_folder(folder: PathBuf) -> ImportResult {
    tracing::info!(folder = %folder.display(), "🔍 scanning folder");

    let mut result = ImportResult::default();
    for path in scan_folder(&folder) {
        match read_image(&path).await {
            Ok(image) => result.images.push(image),
            Err(e) => {
                tracing::warn!(error = %e, "⚠️  skipping file");
                result.skipped_count += 1;
            }
        }
    }

    tracing::info!(
        imported = result.images.len(),
        skipped = result.skipped_count,
        "✅ folder import complete"
    );
    result
}

/// Read a hand-picked list of files, skipping the ones that fail
pub async fn read_images(paths: Vec<PathBuf>) -> ImportResult {
    let mut result = ImportResult::default();
    for path in paths {
        match read_image(&path).await {
            Ok(image) => result.images.push(image),
            Err(e) => {
                tracing::warn!(error = %e, "⚠️  skipping file");
                result.skipped_count += 1;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const GIF_MAGIC: &[u8] = b"GIF89a\x01\x00\x01\x00";

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2024/summer")).unwrap();
        fs::write(dir.path().join("a.png"), PNG_MAGIC).unwrap();
        fs::write(dir.path().join("2024/summer/b.GIF"), GIF_MAGIC).unwrap();
        fs::write(dir.path().join("2024/broken.jpg"), b"garbage").unwrap();
        fs::write(dir.path().join("readme.txt"), b"text").unwrap();
        dir
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = fixture();

        let found: Vec<String> = scan_folder(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(found, vec!["broken.jpg", "b.GIF", "a.png"]);
    }

    #[tokio::test]
    async fn test_import_folder_counts_skipped() {
        let dir = fixture();

        let result = import_folder(dir.path().to_path_buf()).await;

        let titles: Vec<&str> = result.images.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(result.images[0].mime, "image/gif");
        assert_eq!(result.skipped_count, 1);
    }

    #[tokio::test]
    async fn test_read_images_skips_missing() {
        let dir = fixture();
        let paths = vec![dir.path().join("a.png"), dir.path().join("nope.png")];

        let result = read_images(paths).await;

        assert_eq!(result.images.len(), 1);
        assert_eq!(result.skipped_count, 1);
    }
}
