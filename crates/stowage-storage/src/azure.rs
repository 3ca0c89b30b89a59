use async_trait::async_trait;
use object_store::azure::{AzureConfigKey, MicrosoftAzure, MicrosoftAzureBuilder};
use stowage_core::StorageKind;

use crate::object::{config_error, put_with_content_type};
use crate::traits::{Storage, StorageError, StorageResult};

const EMULATOR_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Parsed Azure Storage connection string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub protocol: Option<String>,
    pub endpoint_suffix: Option<String>,
    pub blob_endpoint: Option<String>,
    pub shared_access_signature: Option<String>,
    pub use_development_storage: bool,
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs. Keys are matched case-insensitively and
    /// values may themselves contain `=`.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let mut parsed = ConnectionString::default();

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                StorageError::ConfigError(format!(
                    "Malformed Azure connection string segment: {}",
                    part
                ))
            })?;
            let value = value.trim().to_string();

            match name.trim().to_ascii_lowercase().as_str() {
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "defaultendpointsprotocol" => parsed.protocol = Some(value),
                "endpointsuffix" => parsed.endpoint_suffix = Some(value),
                "blobendpoint" => parsed.blob_endpoint = Some(value),
                "sharedaccesssignature" => parsed.shared_access_signature = Some(value),
                "usedevelopmentstorage" => {
                    parsed.use_development_storage = value.eq_ignore_ascii_case("true")
                }
                // Queue/table/file endpoints are irrelevant to blob uploads.
                _ => {}
            }
        }

        if parsed.account_name.is_none()
            && parsed.blob_endpoint.is_none()
            && !parsed.use_development_storage
        {
            return Err(StorageError::ConfigError(
                "Azure connection string has no AccountName".to_string(),
            ));
        }

        Ok(parsed)
    }

    /// Base URL of the blob service, without a trailing slash.
    pub fn blob_endpoint(&self) -> String {
        if let Some(ref endpoint) = self.blob_endpoint {
            return endpoint.trim_end_matches('/').to_string();
        }
        if self.use_development_storage {
            return EMULATOR_BLOB_ENDPOINT.to_string();
        }
        format!(
            "{}://{}.blob.{}",
            self.protocol.as_deref().unwrap_or("https"),
            self.account_name.as_deref().unwrap_or_default(),
            self.endpoint_suffix
                .as_deref()
                .unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
        )
    }
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("blob_endpoint", &self.blob_endpoint())
            .field("use_development_storage", &self.use_development_storage)
            .finish_non_exhaustive()
    }
}

/// Azure Blob Storage implementation
#[derive(Clone, Debug)]
pub struct AzureStorage {
    connection: ConnectionString,
    container: String,
}

impl AzureStorage {
    pub fn new(connection_string: &str, container: impl Into<String>) -> StorageResult<Self> {
        Ok(AzureStorage {
            connection: ConnectionString::parse(connection_string)?,
            container: container.into(),
        })
    }

    fn client(&self) -> StorageResult<MicrosoftAzure> {
        let conn = &self.connection;
        let mut builder = MicrosoftAzureBuilder::new().with_container_name(&self.container);

        if conn.use_development_storage {
            builder = builder.with_use_emulator(true);
        }
        if let Some(ref account) = conn.account_name {
            builder = builder.with_account(account);
        }
        if let Some(ref key) = conn.account_key {
            builder = builder.with_access_key(key);
        }
        if let Some(ref sas) = conn.shared_access_signature {
            builder = builder.with_config(AzureConfigKey::SasKey, sas.trim_start_matches('?'));
        }
        if let Some(ref endpoint) = conn.blob_endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        } else if conn.protocol.as_deref() == Some("http") {
            builder = builder.with_allow_http(true);
        }

        builder.build().map_err(config_error)
    }

    /// Canonical blob URL: `{blob_endpoint}/{container}/{key}` with each key
    /// segment percent-encoded.
    pub fn blob_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/{}/{}",
            self.connection.blob_endpoint(),
            self.container,
            encoded.join("/")
        )
    }
}

#[async_trait]
impl Storage for AzureStorage {
    async fn store(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String> {
        let size = data.len() as u64;
        let store = self.client()?;
        let start = std::time::Instant::now();

        put_with_content_type(&store, key, data, content_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    container = %self.container,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Azure upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let url = self.blob_url(key);

        tracing::info!(
            container = %self.container,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Azure upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageKind {
        StorageKind::Azure
    }
}
