//! Stowage Core Library
//!
//! This crate provides the upload policy model, its builder and loaders, the
//! per-call file types, and the error taxonomy shared by every Stowage crate.

pub mod builder;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod storage_types;

// Re-export commonly used types
pub use builder::UploadConfigBuilder;
pub use error::{ErrorMetadata, LogLevel, UploadError, UploadResult, ValidationError};
pub use models::{IncomingFile, UploadResponse};
pub use policy::{
    ChunkConfig, ClamAvConfig, CompressionConfig, CompressionSettings, FileTypeConfig,
    ScannerConfig, StorageConfig, UploadConfig, VirusScanConfig, DEFAULT_MAX_SIZE,
};
pub use storage_types::StorageKind;
