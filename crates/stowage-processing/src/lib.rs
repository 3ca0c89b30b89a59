//! Stowage Processing Library
//!
//! The per-file stages of the upload pipeline that do not touch storage:
//! policy validation, image compression and the virus-scanner seam.

pub mod compression;
pub mod scanner;
pub mod validator;

pub use compression::ImageCompressor;
pub use scanner::{ScanError, ScanVerdict, VirusScanner};
pub use validator::{resolve_file_type, validate};
