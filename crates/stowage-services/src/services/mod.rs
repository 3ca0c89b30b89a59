#[cfg(feature = "clamav")]
pub mod clamav;
pub mod upload;

#[cfg(feature = "clamav")]
pub use clamav::ClamAvScanner;
pub use upload::UploadService;
