use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::UploadError;

/// Storage backend kinds
///
/// The tag carried by [`StorageConfig`](crate::StorageConfig). It lives in core
/// because configuration, errors and the storage crate all refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    S3,
    Azure,
    Gcp,
}

impl StorageKind {
    pub const ALL: [StorageKind; 4] = [
        StorageKind::Local,
        StorageKind::S3,
        StorageKind::Azure,
        StorageKind::Gcp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::S3 => "s3",
            StorageKind::Azure => "azure",
            StorageKind::Gcp => "gcp",
        }
    }
}

impl FromStr for StorageKind {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageKind::Local),
            "s3" => Ok(StorageKind::S3),
            "azure" => Ok(StorageKind::Azure),
            "gcp" => Ok(StorageKind::Gcp),
            _ => Err(UploadError::UnsupportedStorageType(s.to_string())),
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
