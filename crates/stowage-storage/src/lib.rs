//! Stowage Storage Library
//!
//! This crate provides the storage abstraction used by the upload pipeline and
//! one implementation per backend: local filesystem, S3-compatible object
//! storage, Azure Blob Storage and Google Cloud Storage.
//!
//! # Storage keys
//!
//! The key passed to [`Storage::store`] is used verbatim as the object name (or
//! the file name below the local destination). Each backend returns its own
//! locator shape:
//!
//! - **Local**: `{destination}/{key}`
//! - **S3**: `https://{bucket}.s3.{region}.amazonaws.com/{key}`
//! - **Azure**: `{blob_endpoint}/{container}/{key}`
//! - **GCP**: `https://storage.googleapis.com/{bucket}/{key}`

#[cfg(feature = "storage-azure")]
pub mod azure;
pub mod factory;
#[cfg(feature = "storage-gcp")]
pub mod gcp;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(
    feature = "storage-s3",
    feature = "storage-azure",
    feature = "storage-gcp"
))]
pub(crate) mod object;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-azure")]
pub use azure::AzureStorage;
pub use factory::create_storage;
#[cfg(feature = "storage-gcp")]
pub use gcp::GcpStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stowage_core::StorageKind;
pub use traits::{Storage, StorageError, StorageResult};
