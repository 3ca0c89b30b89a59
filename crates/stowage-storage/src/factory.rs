use std::sync::Arc;

use stowage_core::{StorageConfig, UploadError, UploadResult};

#[cfg(feature = "storage-azure")]
use crate::AzureStorage;
#[cfg(feature = "storage-gcp")]
use crate::GcpStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::Storage;

/// Create the storage backend selected by the configuration.
///
/// Backends compiled out through cargo features fail with
/// `UploadError::UnsupportedStorageType`.
pub fn create_storage(config: &StorageConfig) -> UploadResult<Arc<dyn Storage>> {
    let kind = config.kind();

    let storage: Arc<dyn Storage> = match config {
        #[cfg(feature = "storage-local")]
        StorageConfig::Local { destination } => Arc::new(LocalStorage::new(destination.clone())),

        #[cfg(feature = "storage-s3")]
        StorageConfig::S3 {
            access_key_id,
            secret_access_key,
            region,
            bucket,
            endpoint,
        } => Arc::new(S3Storage::new(
            access_key_id.clone(),
            secret_access_key.clone(),
            region.clone(),
            bucket.clone(),
            endpoint.clone(),
        )),

        #[cfg(feature = "storage-azure")]
        StorageConfig::Azure {
            connection_string,
            container,
        } => Arc::new(
            AzureStorage::new(connection_string, container.clone())
                .map_err(|e| UploadError::storage(kind, e))?,
        ),

        #[cfg(feature = "storage-gcp")]
        StorageConfig::Gcp {
            project_id,
            key_filename,
            bucket,
        } => Arc::new(GcpStorage::new(
            project_id.clone(),
            key_filename.clone(),
            bucket.clone(),
        )),

        #[allow(unreachable_patterns)]
        _ => {
            return Err(UploadError::UnsupportedStorageType(format!(
                "{} (storage-{} feature not enabled)",
                kind, kind
            )))
        }
    };

    tracing::debug!(backend = %kind, "Storage backend created");
    Ok(storage)
}

#[cfg(all(
    test,
    feature = "storage-local",
    feature = "storage-s3",
    feature = "storage-azure",
    feature = "storage-gcp"
))]
mod tests {
    use super::*;
    use stowage_core::StorageKind;

    #[test]
    fn test_each_config_selects_matching_backend() {
        let configs = [
            StorageConfig::Local {
                destination: "/tmp".into(),
            },
            StorageConfig::S3 {
                access_key_id: "id".to_string(),
                secret_access_key: "secret".to_string(),
                region: "us-east-1".to_string(),
                bucket: "b".to_string(),
                endpoint: None,
            },
            StorageConfig::Azure {
                connection_string: "UseDevelopmentStorage=true".to_string(),
                container: "c".to_string(),
            },
            StorageConfig::Gcp {
                project_id: "p".to_string(),
                key_filename: "/keys/sa.json".into(),
                bucket: "b".to_string(),
            },
        ];

        let kinds: Vec<StorageKind> = configs
            .iter()
            .map(|c| create_storage(c).unwrap().backend_type())
            .collect();
        assert_eq!(kinds, StorageKind::ALL.to_vec());
    }

    #[test]
    fn test_bad_azure_connection_string() {
        let config = StorageConfig::Azure {
            connection_string: "not-a-connection-string".to_string(),
            container: "c".to_string(),
        };
        let err = create_storage(&config).err().unwrap();
        assert!(matches!(
            err,
            UploadError::Storage {
                backend: StorageKind::Azure,
                ..
            }
        ));
    }
}
