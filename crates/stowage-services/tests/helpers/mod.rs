//! Shared fixtures for the upload pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use stowage_core::{FileTypeConfig, StorageKind, UploadConfigBuilder};
use stowage_services::{ScanError, ScanVerdict, Storage, StorageError, StorageResult, VirusScanner};

pub const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory storage backend recording every call.
#[derive(Clone)]
pub struct MockStorage {
    kind: StorageKind,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    calls: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::with_kind(StorageKind::S3)
    }

    pub fn with_kind(kind: StorageKind) -> Self {
        Self {
            kind,
            objects: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn store(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("mock://{}", key))
    }

    fn backend_type(&self) -> StorageKind {
        self.kind
    }
}

/// Backend whose writes always fail.
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn store(&self, _data: Vec<u8>, _key: &str, _content_type: &str) -> StorageResult<String> {
        Err(StorageError::UploadFailed("bucket does not exist".to_string()))
    }

    fn backend_type(&self) -> StorageKind {
        StorageKind::Gcp
    }
}

/// Backend that never finishes within a test's patience.
pub struct StalledStorage;

#[async_trait]
impl Storage for StalledStorage {
    async fn store(&self, _data: Vec<u8>, key: &str, _content_type: &str) -> StorageResult<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(key.to_string())
    }

    fn backend_type(&self) -> StorageKind {
        StorageKind::Azure
    }
}

/// Scanner returning a fixed outcome and remembering what it saw.
pub struct MockScanner {
    outcome: fn() -> Result<ScanVerdict, ScanError>,
    delay: Option<Duration>,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl MockScanner {
    pub fn clean() -> Arc<Self> {
        Self::build(|| Ok(ScanVerdict::clean()), None)
    }

    pub fn infected() -> Arc<Self> {
        Self::build(
            || Ok(ScanVerdict::infected(vec!["Eicar-Test-Signature".to_string()])),
            None,
        )
    }

    pub fn unavailable() -> Arc<Self> {
        Self::build(
            || Err(ScanError::Unavailable("connection refused".to_string())),
            None,
        )
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(|| Ok(ScanVerdict::clean()), Some(delay))
    }

    fn build(outcome: fn() -> Result<ScanVerdict, ScanError>, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            delay,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn scanned(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl VirusScanner for MockScanner {
    async fn scan(&self, data: &[u8]) -> Result<ScanVerdict, ScanError> {
        self.seen.lock().unwrap().push(data.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.outcome)()
    }
}

pub fn png_type(max_size: u64) -> FileTypeConfig {
    FileTypeConfig::new(max_size)
        .with_mime_types(["image/png"])
        .with_extensions(["png"])
}

/// Builder with local storage and a 1 MB PNG rule.
pub fn png_policy() -> UploadConfigBuilder {
    UploadConfigBuilder::new()
        .use_local_storage("/unused")
        .set_file_type("image/png", png_type(MB))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([12, 34, 56, 255]),
    ));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}
