use std::str;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clamav_client::{clean, Tcp};
use stowage_core::ClamAvConfig;
use stowage_processing::{ScanError, ScanVerdict, VirusScanner};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ClamAV daemon client.
///
/// Every scan opens a fresh TCP connection to `clamd` and streams the buffer with
/// the INSTREAM command. Scan failures are always reported; there is no
/// fail-open mode.
#[derive(Clone, Debug)]
pub struct ClamAvScanner {
    host: String,
    port: u16,
    /// Upper bound for one scan, connection included
    timeout: Duration,
}

impl ClamAvScanner {
    /// Create a scanner with the default 30 second timeout.
    ///
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &ClamAvConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }

    /// Use a custom scan timeout (for large files or slow ClamAV instances).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Turn a raw `clamd` reply into a verdict.
fn interpret_response(response: &[u8]) -> Result<ScanVerdict, ScanError> {
    let is_clean = clean(response)
        .map_err(|e| ScanError::Protocol(format!("Failed to parse ClamAV response: {}", e)))?;
    if is_clean {
        return Ok(ScanVerdict::clean());
    }

    let text = str::from_utf8(response)
        .map_err(|e| ScanError::Protocol(e.to_string()))?
        .trim_matches(|c: char| c == '\0' || c.is_whitespace());

    let viruses = parse_signatures(text);
    if viruses.is_empty() {
        // e.g. "INSTREAM size limit exceeded. ERROR"
        return Err(ScanError::Protocol(text.to_string()));
    }
    Ok(ScanVerdict::infected(viruses))
}

/// Extract signature names from `stream: <name> FOUND` lines.
fn parse_signatures(text: &str) -> Vec<String> {
    text.split(['\n', '\0'])
        .filter_map(|line| {
            let line = line.trim();
            let found = line.strip_suffix("FOUND")?;
            let name = found
                .split_once(':')
                .map_or(found, |(_, rest)| rest)
                .trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[async_trait]
impl VirusScanner for ClamAvScanner {
    /// Scan in-memory data using the sync client inside spawn_blocking.
    async fn scan(&self, data: &[u8]) -> Result<ScanVerdict, ScanError> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = self.port, size_bytes = data.len(), "Starting ClamAV scan");

        let data = data.to_vec();
        let address = self.address();
        let timeout = self.timeout;

        let result = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || {
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                clamav_client::scan_buffer(&data, connection, None)
            }),
        )
        .await;

        let response = match result {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, host = %self.host, port = self.port, "ClamAV scan failed");
                return Err(ScanError::Unavailable(format!("ClamAV scan error: {}", e)));
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "ClamAV scan task panicked");
                return Err(ScanError::Unavailable(format!(
                    "ClamAV scan task join error: {}",
                    e
                )));
            }
            Err(_) => {
                tracing::error!(timeout_secs = timeout.as_secs(), "ClamAV scan timeout");
                return Err(ScanError::Timeout(timeout));
            }
        };

        let verdict = interpret_response(&response)?;
        if verdict.is_infected {
            tracing::warn!(
                duration_ms = start.elapsed().as_millis() as u64,
                viruses = ?verdict.viruses,
                "File scan detected virus"
            );
        } else {
            tracing::info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "File scan completed: clean"
            );
        }
        Ok(verdict)
    }
}
