use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use stowage_core::{
    CompressionSettings, ErrorMetadata, IncomingFile, LogLevel, StorageKind, UploadConfig,
    UploadError, UploadResponse, UploadResult,
};
use stowage_processing::{validate, ImageCompressor, VirusScanner};
use stowage_storage::{create_storage, Storage};

/// Upload pipeline: validate, compress, scan, store.
///
/// Cloning is cheap; clones share the policy, the storage backend and the
/// scanner. Concurrent uploads never share per-file state.
#[derive(Clone)]
pub struct UploadService {
    config: Arc<UploadConfig>,
    storage: Arc<dyn Storage>,
    scanner: Option<Arc<dyn VirusScanner>>,
}

impl UploadService {
    /// Build a service whose backend is selected from the policy's storage block.
    pub fn new(config: Arc<UploadConfig>) -> UploadResult<Self> {
        let storage = create_storage(config.storage())?;
        Ok(Self::with_storage(config, storage))
    }

    /// Build a service around an existing backend.
    pub fn with_storage(config: Arc<UploadConfig>, storage: Arc<dyn Storage>) -> Self {
        let scanner = default_scanner(&config);
        Self {
            config,
            storage,
            scanner,
        }
    }

    /// Replace the scanner used when virus scanning is enabled.
    pub fn with_scanner(mut self, scanner: Arc<dyn VirusScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn backend_type(&self) -> StorageKind {
        self.storage.backend_type()
    }

    /// Run one file through the pipeline and return its locator.
    ///
    /// Stages stop at the first failure; nothing is stored unless every earlier
    /// stage succeeded.
    pub async fn upload_file(&self, file: IncomingFile) -> UploadResult<UploadResponse> {
        let start = Instant::now();
        let file_name = file.original_name.clone();

        match self.run(file).await {
            Ok(response) => {
                tracing::info!(
                    key = %file_name,
                    url = %response.url,
                    backend = %self.backend_type(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload completed"
                );
                Ok(response)
            }
            Err(e) => {
                log_failure(&e, &file_name);
                Err(e)
            }
        }
    }

    async fn run(&self, mut file: IncomingFile) -> UploadResult<UploadResponse> {
        validate(&file, &self.config)?;

        if file.is_image() {
            if let Some(settings) = self.config.compression_settings() {
                self.compress(&mut file, settings).await?;
            }
        }

        if self.config.virus_scanning_enabled() {
            self.scan(&file).await?;
        }

        let url = self.store(file).await?;
        Ok(UploadResponse { url })
    }

    async fn compress(
        &self,
        file: &mut IncomingFile,
        settings: CompressionSettings,
    ) -> UploadResult<()> {
        let start = Instant::now();
        let original_size = file.size;
        let content = std::mem::take(&mut file.content);

        let compressed = ImageCompressor::compress_blocking(content, settings).await?;
        file.replace_content(compressed);

        tracing::debug!(
            key = %file.original_name,
            original_size_bytes = original_size,
            size_bytes = file.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image compressed"
        );
        Ok(())
    }

    async fn scan(&self, file: &IncomingFile) -> UploadResult<()> {
        if self.config.virus().and_then(|v| v.clamav()).is_none() {
            return Err(UploadError::ScannerMisconfigured);
        }
        let scanner = self
            .scanner
            .as_ref()
            .ok_or(UploadError::ScannerMisconfigured)?;

        let verdict = bounded("scan", self.config.stage_timeout(), async {
            scanner.scan(&file.content).await.map_err(UploadError::from)
        })
        .await?;

        if verdict.is_infected {
            return Err(UploadError::InfectedFile {
                viruses: verdict.viruses,
            });
        }

        tracing::debug!(key = %file.original_name, "Virus scan passed");
        Ok(())
    }

    async fn store(&self, file: IncomingFile) -> UploadResult<String> {
        let backend = self.storage.backend_type();
        let IncomingFile {
            content,
            mime_type,
            original_name,
            ..
        } = file;

        bounded("store", self.config.stage_timeout(), async {
            self.storage
                .store(content, &original_name, &mime_type)
                .await
                .map_err(|e| UploadError::storage(backend, e))
        })
        .await
    }
}

fn default_scanner(config: &UploadConfig) -> Option<Arc<dyn VirusScanner>> {
    #[cfg(feature = "clamav")]
    {
        let clamav = config
            .virus()
            .filter(|v| v.enabled)
            .and_then(|v| v.clamav())?;
        let mut scanner = super::ClamAvScanner::from_config(clamav);
        if let Some(timeout) = config.stage_timeout() {
            scanner = scanner.with_timeout(timeout);
        }
        Some(Arc::new(scanner) as Arc<dyn VirusScanner>)
    }

    #[cfg(not(feature = "clamav"))]
    {
        let _ = config;
        None
    }
}

/// Await `fut`, giving up after `limit` when one is set.
async fn bounded<T, F>(stage: &'static str, limit: Option<Duration>, fut: F) -> UploadResult<T>
where
    F: Future<Output = UploadResult<T>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| UploadError::Timeout { stage, after })?,
        None => fut.await,
    }
}

fn log_failure(error: &UploadError, file_name: &str) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(key = %file_name, error = %error, error_code = code, "Upload rejected")
        }
        LogLevel::Warn => {
            tracing::warn!(key = %file_name, error = %error, error_code = code, "Upload rejected")
        }
        LogLevel::Error => {
            tracing::error!(key = %file_name, error = %error, error_code = code, "Upload failed")
        }
    }
}
