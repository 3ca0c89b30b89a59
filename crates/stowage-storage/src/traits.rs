//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use stowage_core::StorageKind;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Every backend (local filesystem, S3, Azure Blob, GCS) implements this trait so
/// the upload service can persist files without knowing which one is configured.
/// Implementations hold no per-upload state and may be shared across tasks.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `data` under `key` and return the backend-specific locator
    /// (a filesystem path or an object URL).
    async fn store(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageKind;
}
