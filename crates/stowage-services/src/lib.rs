//! Stowage Services Library
//!
//! The upload orchestrator and its collaborators: [`UploadService`] wires the
//! policy, validator, image compressor, virus scanner and storage backend
//! together. [`ClamAvScanner`] is the production scanner and [`telemetry`]
//! sets up structured logging.

pub mod services;
pub mod telemetry;

#[cfg(feature = "clamav")]
pub use services::ClamAvScanner;
pub use services::UploadService;

// Re-export the pipeline's value types so callers need a single dependency
pub use stowage_core::{
    FileTypeConfig, IncomingFile, UploadConfig, UploadConfigBuilder, UploadError,
    UploadResponse, UploadResult,
};
pub use stowage_processing::{ScanError, ScanVerdict, VirusScanner};
pub use stowage_storage::{Storage, StorageError, StorageResult};
