use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, error};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Filename extensions accepted for product image uploads.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Returns true when `extension` names a recognized image type.
pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
}

/// Blob-storage seam for image artifacts.
///
/// The core only ever calls these two operations and does not know the
/// storage backend. `save` generates a collision-resistant unique name;
/// `delete` reports whether an artifact was actually removed (`false` means
/// it was not there).
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<String, ServiceError>;
    async fn delete(&self, filename: &str) -> Result<bool, ServiceError>;
}

/// Filesystem-backed image store writing under a configured upload directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<String, ServiceError> {
        let filename = format!("{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase());

        fs::create_dir_all(&self.root).await.map_err(|e| {
            error!(error = %e, dir = %self.root.display(), "Failed to create upload directory");
            ServiceError::StorageError(format!("Failed to create upload directory: {}", e))
        })?;

        let path = self.root.join(&filename);
        fs::write(&path, bytes).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to write image artifact");
            ServiceError::StorageError(format!("Failed to write image: {}", e))
        })?;

        debug!(filename = %filename, size = bytes.len(), "Stored image artifact");
        Ok(filename)
    }

    async fn delete(&self, filename: &str) -> Result<bool, ServiceError> {
        let path = self.root.join(filename);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(filename = %filename, "Removed image artifact");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => {
                error!(error = %e, path = %path.display(), "Failed to remove image artifact");
                Err(ServiceError::StorageError(format!(
                    "Failed to remove image: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_extension("png"));
        assert!(is_allowed_extension("JPG"));
        assert!(is_allowed_extension("Jpeg"));
        assert!(!is_allowed_extension("webp"));
        assert!(!is_allowed_extension("exe"));
    }

    #[tokio::test]
    async fn save_and_delete_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsImageStore::new(dir.path());

        let filename = store.save(b"not really a png", "PNG").await.expect("save");
        assert!(filename.ends_with(".png"));
        assert!(dir.path().join(&filename).exists());

        assert!(store.delete(&filename).await.expect("delete"));
        assert!(!dir.path().join(&filename).exists());

        // second delete reports the artifact as already gone
        assert!(!store.delete(&filename).await.expect("re-delete"));
    }
}
