//! Upload policy model
//!
//! [`UploadConfig`] is built once (through [`UploadConfigBuilder`](crate::UploadConfigBuilder),
//! [`UploadConfig::from_env`] or [`UploadConfig::from_json`]) and is read-only afterwards.
//! Optional feature blocks keep an `Option` at every level: `None` means the feature
//! was never configured, while `Some` with an empty sub-config means "enabled with
//! defaults".

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{UploadError, UploadResult};
use crate::storage_types::StorageKind;

/// Fallback size bound applied at build time when none was set (5 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

/// Storage destination, tagged by backend kind.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Local {
        destination: PathBuf,
    },
    S3 {
        access_key_id: String,
        secret_access_key: String,
        region: String,
        bucket: String,
        #[serde(default)]
        endpoint: Option<String>,
    },
    Azure {
        connection_string: String,
        container: String,
    },
    Gcp {
        project_id: String,
        key_filename: PathBuf,
        bucket: String,
    },
}

impl StorageConfig {
    pub fn kind(&self) -> StorageKind {
        match self {
            StorageConfig::Local { .. } => StorageKind::Local,
            StorageConfig::S3 { .. } => StorageKind::S3,
            StorageConfig::Azure { .. } => StorageKind::Azure,
            StorageConfig::Gcp { .. } => StorageKind::Gcp,
        }
    }
}

// Credentials never reach logs.
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageConfig::Local { destination } => f
                .debug_struct("Local")
                .field("destination", destination)
                .finish(),
            StorageConfig::S3 {
                access_key_id,
                region,
                bucket,
                endpoint,
                ..
            } => f
                .debug_struct("S3")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("region", region)
                .field("bucket", bucket)
                .field("endpoint", endpoint)
                .finish(),
            StorageConfig::Azure { container, .. } => f
                .debug_struct("Azure")
                .field("connection_string", &"<redacted>")
                .field("container", container)
                .finish(),
            StorageConfig::Gcp {
                project_id,
                key_filename,
                bucket,
            } => f
                .debug_struct("Gcp")
                .field("project_id", project_id)
                .field("key_filename", key_filename)
                .field("bucket", bucket)
                .finish(),
        }
    }
}

/// Size and type rules for one file-type key (a MIME type or an extension).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypeConfig {
    pub max_size: u64,
    #[serde(default)]
    pub allowed_mime_types: HashSet<String>,
    #[serde(default)]
    pub allowed_extensions: HashSet<String>,
}

impl FileTypeConfig {
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            ..Default::default()
        }
    }

    pub fn with_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types
            .extend(mime_types.into_iter().map(Into::into));
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions
            .extend(extensions.into_iter().map(Into::into));
        self
    }

    pub fn allows_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(mime_type)
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(extension)
    }

    /// Allowed MIME types in a stable order, for error messages.
    pub fn sorted_mime_types(&self) -> Vec<String> {
        let mut v: Vec<String> = self.allowed_mime_types.iter().cloned().collect();
        v.sort();
        v
    }

    /// Allowed extensions in a stable order, for error messages.
    pub fn sorted_extensions(&self) -> Vec<String> {
        let mut v: Vec<String> = self.allowed_extensions.iter().cloned().collect();
        v.sort();
        v
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClamAvConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub clamav: Option<ClamAvConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirusScanConfig {
    pub enabled: bool,
    #[serde(default)]
    pub config: Option<ScannerConfig>,
}

impl VirusScanConfig {
    pub fn clamav(&self) -> Option<&ClamAvConfig> {
        self.config.as_ref().and_then(|c| c.clamav.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub max_height: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    #[serde(default)]
    pub config: Option<CompressionSettings>,
}

/// Chunked upload settings. Carried for configuration compatibility; the
/// pipeline does not read them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub enabled: bool,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Immutable upload policy shared by all uploads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub(crate) storage: StorageConfig,
    pub(crate) file_types: HashMap<String, FileTypeConfig>,
    #[serde(default = "default_max_size")]
    pub(crate) default_max_size: u64,
    #[serde(default)]
    pub(crate) virus: Option<VirusScanConfig>,
    #[serde(default)]
    pub(crate) compression: Option<CompressionConfig>,
    #[serde(default)]
    pub(crate) chunks: Option<ChunkConfig>,
    #[serde(default)]
    pub(crate) stage_timeout_ms: Option<u64>,
}

impl UploadConfig {
    pub fn builder() -> crate::UploadConfigBuilder {
        crate::UploadConfigBuilder::new()
    }

    /// Check the invariants every policy must satisfy.
    pub fn validate(&self) -> UploadResult<()> {
        if self.file_types.is_empty() {
            return Err(UploadError::Configuration(
                "at least one file type must be configured".to_string(),
            ));
        }
        if self.stage_timeout_ms == Some(0) {
            return Err(UploadError::Configuration(
                "stage timeout must be at least 1 ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage.kind()
    }

    pub fn file_types(&self) -> &HashMap<String, FileTypeConfig> {
        &self.file_types
    }

    pub fn file_type(&self, key: &str) -> Option<&FileTypeConfig> {
        self.file_types.get(key)
    }

    /// Configured fallback bound. Validation never consults it.
    pub fn default_max_size(&self) -> u64 {
        self.default_max_size
    }

    pub fn virus(&self) -> Option<&VirusScanConfig> {
        self.virus.as_ref()
    }

    pub fn virus_scanning_enabled(&self) -> bool {
        self.virus.as_ref().is_some_and(|v| v.enabled)
    }

    pub fn compression(&self) -> Option<&CompressionConfig> {
        self.compression.as_ref()
    }

    /// Settings to compress with, when compression is enabled.
    pub fn compression_settings(&self) -> Option<CompressionSettings> {
        self.compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.config.clone().unwrap_or_default())
    }

    pub fn chunks(&self) -> Option<&ChunkConfig> {
        self.chunks.as_ref()
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_ms.map(Duration::from_millis)
    }
}
