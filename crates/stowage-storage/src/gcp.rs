use std::path::PathBuf;

use async_trait::async_trait;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use stowage_core::StorageKind;

use crate::object::{config_error, put_with_content_type};
use crate::traits::{Storage, StorageError, StorageResult};

/// Google Cloud Storage implementation
///
/// Authenticates with a service-account key file. The project id is not needed
/// by the object API and is only reported in logs.
#[derive(Clone, Debug)]
pub struct GcpStorage {
    project_id: String,
    key_filename: PathBuf,
    bucket: String,
}

impl GcpStorage {
    pub fn new(
        project_id: impl Into<String>,
        key_filename: impl Into<PathBuf>,
        bucket: impl Into<String>,
    ) -> Self {
        GcpStorage {
            project_id: project_id.into(),
            key_filename: key_filename.into(),
            bucket: bucket.into(),
        }
    }

    fn client(&self) -> StorageResult<GoogleCloudStorage> {
        GoogleCloudStorageBuilder::new()
            .with_service_account_path(self.key_filename.to_string_lossy())
            .with_bucket_name(&self.bucket)
            .build()
            .map_err(config_error)
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl Storage for GcpStorage {
    async fn store(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String> {
        let size = data.len() as u64;
        let store = self.client()?;
        let start = std::time::Instant::now();

        put_with_content_type(&store, key, data, content_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    project_id = %self.project_id,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "GCS upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let url = self.object_url(key);

        tracing::info!(
            project_id = %self.project_id,
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageKind {
        StorageKind::Gcp
    }
}
