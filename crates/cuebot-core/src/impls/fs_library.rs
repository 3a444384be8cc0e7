//! FsMediaLibrary - ローカルファイルシステム上のメディア列挙
//!
//! walkdir で再帰的に走査し、拡張子でフィルタします。

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::ports::{LibraryError, MediaLibrary, is_media_file};

#[derive(Debug, Clone, Copy, Default)]
pub struct FsMediaLibrary;

impl FsMediaLibrary {
    pub fn new() -> Self {
        Self
    }
}

fn scan(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    if !dir.is_dir() {
        return Err(LibraryError::Scan {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_media_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    debug!(dir = %dir.display(), count = files.len(), "scanned media folder");
    Ok(files)
}

#[async_trait::async_trait]
impl MediaLibrary for FsMediaLibrary {
    async fn media_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
        let dir = dir.to_path_buf();
        let scan_dir = dir.clone();
        tokio::task::spawn_blocking(move || scan(&scan_dir))
            .await
            .map_err(|e| LibraryError::Scan {
                path: dir,
                message: e.to_string(),
            })?
    }

    async fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn finds_media_recursively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        for name in ["b.MP4", "a.wav", "readme.txt", "sub/c.mov"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = FsMediaLibrary::new().media_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.MP4", "sub/c.mov"]);
    }

    #[tokio::test]
    async fn missing_folder_is_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsMediaLibrary::new()
            .media_files(&dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Scan { .. }));
    }

    #[tokio::test]
    async fn exists_checks_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        fs::write(&file, b"").unwrap();
        let library = FsMediaLibrary::new();
        assert!(library.exists(&file).await);
        assert!(!library.exists(dir.path()).await);
    }
}
