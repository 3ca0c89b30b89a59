use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{UploadError, UploadResult};
use crate::policy::{
    ChunkConfig, ClamAvConfig, CompressionConfig, CompressionSettings, FileTypeConfig,
    ScannerConfig, StorageConfig, UploadConfig, VirusScanConfig, DEFAULT_MAX_SIZE,
};

/// Fluent builder for [`UploadConfig`].
///
/// Every setter takes the builder by value and hands it back, so calls chain:
///
/// ```
/// use stowage_core::{FileTypeConfig, UploadConfigBuilder};
///
/// let config = UploadConfigBuilder::new()
///     .use_local_storage("/tmp/uploads")
///     .set_file_type(
///         "image/png",
///         FileTypeConfig::new(1024 * 1024)
///             .with_mime_types(["image/png"])
///             .with_extensions(["png"]),
///     )
///     .enable_compression(Some(80), Some(1920), None)
///     .build()
///     .unwrap();
///
/// assert!(config.compression_settings().is_some());
/// ```
#[derive(Debug, Default, Clone)]
pub struct UploadConfigBuilder {
    storage: Option<StorageConfig>,
    file_types: HashMap<String, FileTypeConfig>,
    default_max_size: Option<u64>,
    virus: Option<VirusScanConfig>,
    compression: Option<CompressionConfig>,
    chunks: Option<ChunkConfig>,
    stage_timeout: Option<Duration>,
}

impl UploadConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_local_storage(mut self, destination: impl Into<PathBuf>) -> Self {
        self.storage = Some(StorageConfig::Local {
            destination: destination.into(),
        });
        self
    }

    pub fn use_s3_storage(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
        endpoint: Option<String>,
    ) -> Self {
        self.storage = Some(StorageConfig::S3 {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            bucket: bucket.into(),
            endpoint,
        });
        self
    }

    pub fn use_azure_storage(
        mut self,
        connection_string: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        self.storage = Some(StorageConfig::Azure {
            connection_string: connection_string.into(),
            container: container.into(),
        });
        self
    }

    pub fn use_gcp_storage(
        mut self,
        project_id: impl Into<String>,
        key_filename: impl Into<PathBuf>,
        bucket: impl Into<String>,
    ) -> Self {
        self.storage = Some(StorageConfig::Gcp {
            project_id: project_id.into(),
            key_filename: key_filename.into(),
            bucket: bucket.into(),
        });
        self
    }

    /// Register (or replace) the rules for one MIME type or extension key.
    pub fn set_file_type(mut self, key: impl Into<String>, config: FileTypeConfig) -> Self {
        self.file_types.insert(key.into(), config);
        self
    }

    pub fn set_default_max_size(mut self, bytes: u64) -> Self {
        self.default_max_size = Some(bytes);
        self
    }

    pub fn enable_virus_scanning(mut self, host: impl Into<String>, port: u16) -> Self {
        self.virus = Some(VirusScanConfig {
            enabled: true,
            config: Some(ScannerConfig {
                clamav: Some(ClamAvConfig {
                    host: host.into(),
                    port,
                }),
            }),
        });
        self
    }

    pub fn enable_compression(
        mut self,
        quality: Option<u8>,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Self {
        self.compression = Some(CompressionConfig {
            enabled: true,
            config: Some(CompressionSettings {
                quality,
                max_width,
                max_height,
            }),
        });
        self
    }

    pub fn enable_chunked_uploads(mut self, size: Option<u64>) -> Self {
        self.chunks = Some(ChunkConfig {
            enabled: true,
            size,
        });
        self
    }

    /// Bound the scan and store stages of every upload.
    pub fn set_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> UploadResult<UploadConfig> {
        let storage = self.storage.ok_or_else(|| {
            UploadError::Configuration("storage configuration is required".to_string())
        })?;

        let stage_timeout_ms = self
            .stage_timeout
            .map(|d| {
                u64::try_from(d.as_millis()).map_err(|_| {
                    UploadError::Configuration(format!("stage timeout {:?} is too large", d))
                })
            })
            .transpose()?;

        let config = UploadConfig {
            storage,
            file_types: self.file_types,
            default_max_size: self.default_max_size.unwrap_or(DEFAULT_MAX_SIZE),
            virus: self.virus,
            compression: self.compression,
            chunks: self.chunks,
            stage_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_types::StorageKind;

    fn png_type() -> FileTypeConfig {
        FileTypeConfig::new(1024 * 1024)
            .with_mime_types(["image/png"])
            .with_extensions(["png"])
    }

    #[test]
    fn test_build_requires_storage() {
        let err = UploadConfigBuilder::new()
            .set_file_type("image/png", png_type())
            .build()
            .unwrap_err();
        assert!(matches!(err, UploadError::Configuration(ref m) if m.contains("storage")));
    }

    #[test]
    fn test_build_requires_file_types() {
        let err = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .build()
            .unwrap_err();
        assert!(matches!(err, UploadError::Configuration(ref m) if m.contains("file type")));
    }

    #[test]
    fn test_default_max_size_applied() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .build()
            .unwrap();
        assert_eq!(config.default_max_size(), 5 * 1024 * 1024);

        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .set_default_max_size(42)
            .build()
            .unwrap();
        assert_eq!(config.default_max_size(), 42);
    }

    #[test]
    fn test_last_storage_wins() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .use_azure_storage("UseDevelopmentStorage=true", "files")
            .set_file_type("image/png", png_type())
            .build()
            .unwrap();
        assert_eq!(config.storage_kind(), StorageKind::Azure);
    }

    #[test]
    fn test_file_types_accumulate_and_overwrite() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", FileTypeConfig::new(1))
            .set_file_type("jpg", FileTypeConfig::new(2))
            .set_file_type("image/png", FileTypeConfig::new(3))
            .build()
            .unwrap();
        assert_eq!(config.file_types().len(), 2);
        assert_eq!(config.file_type("image/png").unwrap().max_size, 3);
        assert_eq!(config.file_type("jpg").unwrap().max_size, 2);
    }

    #[test]
    fn test_optional_blocks_unset_by_default() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .build()
            .unwrap();
        assert!(config.virus().is_none());
        assert!(config.compression().is_none());
        assert!(config.chunks().is_none());
        assert!(config.stage_timeout().is_none());
        assert!(!config.virus_scanning_enabled());
    }

    #[test]
    fn test_enable_virus_scanning_nests_clamav() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .enable_virus_scanning("clamd", 3310)
            .build()
            .unwrap();
        let clamav = config.virus().and_then(|v| v.clamav()).unwrap();
        assert_eq!(clamav.host, "clamd");
        assert_eq!(clamav.port, 3310);
        assert!(config.virus_scanning_enabled());
    }

    #[test]
    fn test_enable_compression_without_arguments() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .enable_compression(None, None, None)
            .build()
            .unwrap();
        let compression = config.compression().unwrap();
        assert!(compression.enabled);
        assert_eq!(compression.config, Some(CompressionSettings::default()));
    }

    #[test]
    fn test_chunks_and_timeout() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .enable_chunked_uploads(Some(1024))
            .set_stage_timeout(Duration::from_secs(9))
            .build()
            .unwrap();
        assert_eq!(
            config.chunks(),
            Some(&ChunkConfig {
                enabled: true,
                size: Some(1024)
            })
        );
        assert_eq!(config.stage_timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_sub_second_timeout_keeps_millis() {
        let config = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type("image/png", png_type())
            .set_stage_timeout(Duration::from_millis(800))
            .build()
            .unwrap();
        assert_eq!(config.stage_timeout(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        for timeout in [Duration::ZERO, Duration::from_micros(300)] {
            let err = UploadConfigBuilder::new()
                .use_local_storage("/tmp")
                .set_file_type("image/png", png_type())
                .set_stage_timeout(timeout)
                .build()
                .unwrap_err();
            assert!(matches!(err, UploadError::Configuration(ref m) if m.contains("stage timeout")));
        }
    }
}
