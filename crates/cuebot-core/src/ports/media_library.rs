//! MediaLibrary port - メディアファイルの列挙

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Extensions recognized as playable media (compared case-insensitively).
pub const MEDIA_EXTENSIONS: [&str; 5] = ["mp4", "avi", "mov", "wmv", "wav"];

pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("cannot scan {}: {message}", .path.display())]
    Scan { path: PathBuf, message: String },
}

#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// All media files under `dir`, recursively, in a stable order.
    async fn media_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LibraryError>;

    async fn exists(&self, path: &Path) -> bool;
}
