//! Configuration loading
//!
//! Builds an [`UploadConfig`] from process environment variables (with `.env`
//! support) or from a JSON document. Both paths end in the same build
//! invariants as [`UploadConfigBuilder`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::builder::UploadConfigBuilder;
use crate::error::{UploadError, UploadResult};
use crate::policy::{FileTypeConfig, UploadConfig};
use crate::storage_types::StorageKind;

const MAX_FILE_SIZE_MB: u64 = 10;
const CLAMAV_PORT: u16 = 3310;
const BYTES_PER_MB: u64 = 1024 * 1024;
const DEFAULT_STORAGE_TYPE: &str = "s3";
const DEFAULT_ALLOWED_EXTENSIONS: &str = "jpg,jpeg,png,gif,webp";
const DEFAULT_ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";

fn megabytes(name: &str, mb: u64) -> UploadResult<u64> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| UploadError::Configuration(format!("{} is too large: {}", name, mb)))
}

struct EnvSource<F> {
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> UploadResult<String> {
        self.get(name)
            .ok_or_else(|| UploadError::Configuration(format!("{} must be set", name)))
    }

    fn parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name)
            .unwrap_or_else(|| "false".to_string())
            .to_lowercase()
            .parse()
            .unwrap_or(false)
    }

    fn list(&self, name: &str, default: &str) -> Vec<String> {
        self.get(name)
            .unwrap_or_else(|| default.to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl UploadConfig {
    /// Load the policy from environment variables, reading `.env` first when present.
    pub fn from_env() -> UploadResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> UploadResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { lookup };

        let storage_type = env
            .get("STORAGE_TYPE")
            .unwrap_or_else(|| DEFAULT_STORAGE_TYPE.to_string());
        let kind = StorageKind::from_str(&storage_type)?;

        let mut builder = UploadConfigBuilder::new();
        builder = match kind {
            StorageKind::Local => builder.use_local_storage(env.required("LOCAL_STORAGE_PATH")?),
            StorageKind::S3 => {
                let region = env
                    .get("S3_REGION")
                    .or_else(|| env.get("AWS_REGION"))
                    .ok_or_else(|| {
                        UploadError::Configuration("S3_REGION or AWS_REGION must be set".to_string())
                    })?;
                builder.use_s3_storage(
                    env.required("AWS_ACCESS_KEY_ID")?,
                    env.required("AWS_SECRET_ACCESS_KEY")?,
                    region,
                    env.required("S3_BUCKET")?,
                    env.get("S3_ENDPOINT"),
                )
            }
            StorageKind::Azure => builder.use_azure_storage(
                env.required("AZURE_STORAGE_CONNECTION_STRING")?,
                env.required("AZURE_CONTAINER")?,
            ),
            StorageKind::Gcp => builder.use_gcp_storage(
                env.required("GCP_PROJECT_ID")?,
                env.required("GCP_KEY_FILENAME")?,
                env.required("GCS_BUCKET")?,
            ),
        };

        let max_file_size_mb = env
            .parsed::<u64>("MAX_FILE_SIZE_MB")
            .unwrap_or(MAX_FILE_SIZE_MB);
        let allowed_extensions = env.list("ALLOWED_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS);
        let allowed_content_types = env.list("ALLOWED_CONTENT_TYPES", DEFAULT_ALLOWED_CONTENT_TYPES);

        let file_type = FileTypeConfig::new(megabytes("MAX_FILE_SIZE_MB", max_file_size_mb)?)
            .with_mime_types(allowed_content_types.iter().cloned())
            .with_extensions(allowed_extensions);
        for content_type in allowed_content_types {
            builder = builder.set_file_type(content_type, file_type.clone());
        }

        if let Some(mb) = env.parsed::<u64>("DEFAULT_MAX_SIZE_MB") {
            builder = builder.set_default_max_size(megabytes("DEFAULT_MAX_SIZE_MB", mb)?);
        }

        if env.flag("CLAMAV_ENABLED") {
            builder = builder.enable_virus_scanning(
                env.get("CLAMAV_HOST")
                    .unwrap_or_else(|| "localhost".to_string()),
                env.parsed("CLAMAV_PORT").unwrap_or(CLAMAV_PORT),
            );
        }

        if env.flag("COMPRESSION_ENABLED") {
            builder = builder.enable_compression(
                env.parsed("COMPRESSION_QUALITY"),
                env.parsed("COMPRESSION_MAX_WIDTH"),
                env.parsed("COMPRESSION_MAX_HEIGHT"),
            );
        }

        if env.flag("CHUNKED_UPLOADS_ENABLED") {
            builder = builder.enable_chunked_uploads(env.parsed("CHUNK_SIZE_BYTES"));
        }

        if let Some(secs) = env.parsed::<u64>("STAGE_TIMEOUT_SECS") {
            builder = builder.set_stage_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Parse a JSON policy document.
    pub fn from_json(json: &str) -> UploadResult<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| UploadError::Configuration(format!("invalid JSON: {}", e)))?;

        // Storage tags match case-insensitively, as STORAGE_TYPE does.
        if let Some(tag) = value.pointer_mut("/storage/type") {
            if let Some(name) = tag.as_str() {
                let kind = StorageKind::from_str(name)?;
                *tag = serde_json::Value::from(kind.as_str());
            }
        }

        let config: UploadConfig = serde_json::from_value(value)
            .map_err(|e| UploadError::Configuration(format!("invalid upload config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
