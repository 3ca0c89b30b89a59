//! Shared `object_store` upload path for the cloud backends.

use bytes::Bytes;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};

use crate::traits::StorageError;

/// Put `data` at `key`, tagging the object with `content_type`.
pub(crate) async fn put_with_content_type(
    store: &dyn ObjectStore,
    key: &str,
    data: Vec<u8>,
    content_type: &str,
) -> object_store::Result<()> {
    let location = Path::from(key.to_string());

    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    let opts = PutOptions {
        attributes,
        ..Default::default()
    };

    store
        .put_opts(&location, PutPayload::from(Bytes::from(data)), opts)
        .await?;
    Ok(())
}

pub(crate) fn config_error(e: object_store::Error) -> StorageError {
    StorageError::ConfigError(e.to_string())
}
