//! File-backed storage for generated images
//!
//! Files live under `{media_dir}/{slot dir}/{prefix}_{8 hex}.png` and the
//! database only keeps the path relative to `media_dir`.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ImageSlot;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid media path: {0}")]
    InvalidPath(String),
}

/// Image blob store rooted at the media directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write PNG bytes for a slot; returns the relative path
    pub async fn save(&self, slot: ImageSlot, bytes: &[u8]) -> Result<String, MediaError> {
        debug!(?slot, bytes = bytes.len(), "MediaStore::save: called");
        let dir = self.root.join(slot.media_dir());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| MediaError::Io { path: dir.clone(), source })?;

        let relative = format!("{}/{}_{}.png", slot.media_dir(), slot.file_prefix(), short_id());
        let path = self.root.join(&relative);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| MediaError::Io { path: path.clone(), source })?;

        info!(path = %relative, "Saved image");
        Ok(relative)
    }

    /// Read a previously saved file
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, MediaError> {
        debug!(%relative, "MediaStore::read: called");
        let path = self.resolve(relative)?;
        tokio::fs::read(&path)
            .await
            .map_err(|source| MediaError::Io { path, source })
    }

    /// Delete a saved file; a file that is already gone is not an error
    pub async fn remove(&self, relative: &str) -> Result<(), MediaError> {
        debug!(%relative, "MediaStore::remove: called");
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %relative, "Removed image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(MediaError::Io { path, source }),
        }
    }

    /// Best-effort removal of files the database no longer points at
    pub async fn discard(&self, paths: &[String]) {
        for relative in paths {
            if let Err(e) = self.remove(relative).await {
                warn!(path = %relative, error = %e, "Failed to remove stale image");
            }
        }
    }

    /// Absolute path for a relative media path; rejects escapes from the root
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        let rel = Path::new(relative);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Eight random hex characters
fn short_id() -> String {
    let id = Uuid::now_v7().simple().to_string();
    // v7 ids lead with the timestamp; the tail is random
    id[id.len() - 8..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_read() {
        let temp = TempDir::new().unwrap();
        let media = MediaStore::new(temp.path());

        let relative = media.save(ImageSlot::CompletePalace, b"png bytes").await.unwrap();
        assert!(relative.starts_with("complete_palaces/complete_palace_"));
        assert!(relative.ends_with(".png"));
        let stem = relative
            .trim_start_matches("complete_palaces/complete_palace_")
            .trim_end_matches(".png");
        assert_eq!(stem.len(), 8);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(media.read(&relative).await.unwrap(), b"png bytes");
        assert!(temp.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn test_save_twice_gives_distinct_paths() {
        let temp = TempDir::new().unwrap();
        let media = MediaStore::new(temp.path());
        let a = media.save(ImageSlot::Palace, b"a").await.unwrap();
        let b = media.save(ImageSlot::Palace, b"b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let media = MediaStore::new(temp.path());
        assert!(matches!(media.read("palaces/missing.png").await, Err(MediaError::Io { .. })));
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let temp = TempDir::new().unwrap();
        let media = MediaStore::new(temp.path());
        let relative = media.save(ImageSlot::Palace, b"old").await.unwrap();

        media.remove(&relative).await.unwrap();
        assert!(!temp.path().join(&relative).exists());

        // Already gone
        media.remove(&relative).await.unwrap();
        assert!(matches!(media.remove("../outside.png").await, Err(MediaError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_discard_skips_bad_paths() {
        let temp = TempDir::new().unwrap();
        let media = MediaStore::new(temp.path());
        let a = media.save(ImageSlot::Palace, b"a").await.unwrap();
        let b = media.save(ImageSlot::CompletePalace, b"b").await.unwrap();

        media
            .discard(&[a.clone(), "../escape.png".to_string(), b.clone()])
            .await;
        assert!(!temp.path().join(&a).exists());
        assert!(!temp.path().join(&b).exists());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let media = MediaStore::new("/srv/media");
        assert!(media.resolve("../etc/passwd").is_err());
        assert!(media.resolve("/etc/passwd").is_err());
        assert_eq!(
            media.resolve("palaces/palace_1.png").unwrap(),
            PathBuf::from("/srv/media/palaces/palace_1.png")
        );
    }
}
