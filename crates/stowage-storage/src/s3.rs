use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use stowage_core::StorageKind;

use crate::object::{config_error, put_with_content_type};
use crate::traits::{Storage, StorageError, StorageResult};

/// S3 storage implementation
///
/// A client is built from the stored settings for every upload, so no connection
/// state outlives a call.
#[derive(Clone)]
pub struct S3Storage {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    bucket: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `bucket` - S3 bucket name
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        S3Storage {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            bucket: bucket.into(),
            endpoint_url,
        }
    }

    fn client(&self) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::new()
            .with_access_key_id(&self.access_key_id)
            .with_secret_access_key(&self.secret_access_key)
            .with_region(&self.region)
            .with_bucket_name(&self.bucket);

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder.build().map_err(config_error)
    }

    /// Public URL for an S3 object.
    ///
    /// Always the AWS virtual-hosted form
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`, including when a custom
    /// endpoint is configured.
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}

impl std::fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Storage")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn store(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String> {
        let size = data.len() as u64;
        let store = self.client()?;
        let start = std::time::Instant::now();

        put_with_content_type(&store, key, data, content_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let url = self.object_url(key);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageKind {
        StorageKind::S3
    }
}
