//! Virus scanning seam
//!
//! The upload service only talks to [`VirusScanner`]; the ClamAV client lives in
//! `stowage-services` and tests substitute their own scanners.

use std::time::Duration;

use async_trait::async_trait;
use stowage_core::UploadError;
use thiserror::Error;

/// Outcome of a completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanVerdict {
    pub is_infected: bool,
    pub viruses: Vec<String>,
}

impl ScanVerdict {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn infected(viruses: Vec<String>) -> Self {
        Self {
            is_infected: true,
            viruses,
        }
    }
}

/// Reasons a scan produced no verdict.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scanner unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected scanner response: {0}")]
    Protocol(String),

    #[error("Scan did not complete within {0:?}")]
    Timeout(Duration),
}

impl From<ScanError> for UploadError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Timeout(after) => UploadError::Timeout {
                stage: "scan",
                after,
            },
            other => UploadError::ScanFailed(other.to_string()),
        }
    }
}

#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, data: &[u8]) -> Result<ScanVerdict, ScanError>;
}
