use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use stowage_core::StorageKind;
use tokio::fs;

use crate::traits::{Storage, StorageError, StorageResult};

/// Local filesystem storage implementation
///
/// Files are written to `destination/key`. The destination directory must already
/// exist; an existing file at the target path is overwritten.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    destination: PathBuf,
}

impl LocalStorage {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        LocalStorage {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Resolve a key below the destination directory.
    ///
    /// Absolute keys and keys with a `..` component would escape the destination
    /// and are rejected.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
        }

        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || relative.is_absolute() {
            return Err(StorageError::InvalidKey(format!(
                "Storage key resolves outside storage directory: {}",
                key
            )));
        }

        Ok(self.destination.join(relative))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, data: Vec<u8>, key: &str, _content_type: &str) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        fs::write(&path, &data).await.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path.display(),
                key = %key,
                size_bytes = size,
                "Local storage write failed"
            );
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(path.to_string_lossy().into_owned())
    }

    fn backend_type(&self) -> StorageKind {
        StorageKind::Local
    }
}
