//! Error types module
//!
//! Every stage of the upload pipeline reports failures through [`UploadError`].
//! Validation failures are grouped in [`ValidationError`] so the validator can be
//! used on its own; they convert into `UploadError::Validation`.
//!
//! [`ErrorMetadata`] lets an outer transport layer map each kind to a response
//! without matching on variants itself.

use std::time::Duration;

use crate::storage_types::StorageKind;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn format_mb(bytes: &u64) -> String {
    let formatted = format!("{:.2}", *bytes as f64 / BYTES_PER_MB);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn display_extension(extension: &Option<String>) -> &str {
    extension.as_deref().unwrap_or("<none>")
}

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected content such as infected files
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether the caller caused the failure (4xx family)
    fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// File validation failures, reported in validation order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {mime_type} (extension: {})", display_extension(.extension))]
    UnsupportedFileType {
        mime_type: String,
        extension: Option<String>,
    },

    #[error("File too large: {size} bytes exceeds the {} MB limit", format_mb(.max))]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid MIME type: {mime_type} (allowed: {allowed:?})")]
    InvalidMimeType {
        mime_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid file extension: {} (allowed: {allowed:?})", display_extension(.extension))]
    InvalidExtension {
        extension: Option<String>,
        allowed: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Virus scanning is enabled but no ClamAV host/port is configured")]
    ScannerMisconfigured,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Image compression failed: {0}")]
    Compression(String),

    #[error("Virus scan failed: {0}")]
    ScanFailed(String),

    #[error("File is infected: {}", .viruses.join(", "))]
    InfectedFile { viruses: Vec<String> },

    #[error("Unsupported storage type: {0}")]
    UnsupportedStorageType(String),

    #[error("Storage error ({backend}): {source}")]
    Storage {
        backend: StorageKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{stage} stage timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },
}

impl UploadError {
    pub fn storage(
        backend: StorageKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        UploadError::Storage {
            backend,
            source: source.into(),
        }
    }

    /// Configuration problems, whether caught at build time or at call time.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            UploadError::Configuration(_)
                | UploadError::ScannerMisconfigured
                | UploadError::UnsupportedStorageType(_)
        )
    }
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

impl ErrorMetadata for ValidationError {
    fn http_status_code(&self) -> u16 {
        match self {
            ValidationError::FileTooLarge { .. } => 413,
            ValidationError::UnsupportedFileType { .. }
            | ValidationError::InvalidMimeType { .. } => 415,
            ValidationError::InvalidExtension { .. } => 400,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            ValidationError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ValidationError::InvalidMimeType { .. } => "INVALID_MIME_TYPE",
            ValidationError::InvalidExtension { .. } => "INVALID_EXTENSION",
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

impl ErrorMetadata for UploadError {
    fn http_status_code(&self) -> u16 {
        match self {
            UploadError::Validation(e) => e.http_status_code(),
            UploadError::InfectedFile { .. } => 422,
            UploadError::Compression(_) => 422,
            UploadError::Timeout { .. } => 504,
            UploadError::ScanFailed(_) | UploadError::Storage { .. } => 502,
            UploadError::Configuration(_)
            | UploadError::ScannerMisconfigured
            | UploadError::UnsupportedStorageType(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Configuration(_) => "CONFIGURATION_ERROR",
            UploadError::ScannerMisconfigured => "SCANNER_MISCONFIGURED",
            UploadError::Validation(e) => e.error_code(),
            UploadError::Compression(_) => "COMPRESSION_ERROR",
            UploadError::ScanFailed(_) => "SCAN_FAILED",
            UploadError::InfectedFile { .. } => "INFECTED_FILE",
            UploadError::UnsupportedStorageType(_) => "UNSUPPORTED_STORAGE_TYPE",
            UploadError::Storage { .. } => "STORAGE_ERROR",
            UploadError::Timeout { .. } => "TIMEOUT",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::Validation(_) | UploadError::Compression(_) => LogLevel::Debug,
            UploadError::InfectedFile { .. } | UploadError::Timeout { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message_shows_limit_in_mb() {
        let err = ValidationError::FileTooLarge {
            size: 2 * 1024 * 1024,
            max: 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "File too large: 2097152 bytes exceeds the 1 MB limit"
        );

        let err = ValidationError::FileTooLarge {
            size: 10,
            max: 1536 * 1024,
        };
        assert!(err.to_string().contains("1.5 MB"));
    }

    #[test]
    fn test_missing_extension_is_displayed() {
        let err = ValidationError::InvalidExtension {
            extension: None,
            allowed: vec!["png".to_string()],
        };
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn test_infected_file_lists_signatures() {
        let err = UploadError::InfectedFile {
            viruses: vec!["Eicar-Signature".to_string(), "Win.Test".to_string()],
        };
        assert_eq!(err.to_string(), "File is infected: Eicar-Signature, Win.Test");
    }

    #[test]
    fn test_validation_errors_are_client_errors() {
        let err: UploadError = ValidationError::FileTooLarge { size: 2, max: 1 }.into();
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "FILE_TOO_LARGE");
        assert!(err.is_client_error());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_infrastructure_errors_are_server_errors() {
        let err = UploadError::storage(
            StorageKind::S3,
            std::io::Error::new(std::io::ErrorKind::Other, "connection reset"),
        );
        assert_eq!(err.http_status_code(), 502);
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("(s3)"));
        assert!(std::error::Error::source(&err).is_some());

        let err = UploadError::Timeout {
            stage: "scan",
            after: Duration::from_secs(5),
        };
        assert_eq!(err.http_status_code(), 504);
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_configuration_kinds() {
        assert!(UploadError::ScannerMisconfigured.is_configuration());
        assert!(UploadError::Configuration("x".into()).is_configuration());
        assert!(UploadError::UnsupportedStorageType("nfs".into()).is_configuration());
        assert!(!UploadError::ScanFailed("x".into()).is_configuration());
    }
}
