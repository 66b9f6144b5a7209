use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::backend::{AccessToken, ObjectStorage};
use crate::errors::ServiceError;

/// A file picked by the operator.
#[derive(Debug, Clone, Default)]
pub struct LocalFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// An `<input type=file>` left empty submits a nameless, empty part.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }
}

/// Puts project images into object storage under fresh keys.
pub struct ImageUploader {
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    prefix: String,
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self { storage, bucket: bucket.into(), prefix: prefix.into() }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `{prefix}/{uuid}.{ext}`, where `ext` is whatever follows the last dot
    /// of the original name (the whole name when there is none).
    pub fn storage_key(&self, file_name: &str) -> String {
        let ext = file_name.rsplit('.').next().unwrap_or(file_name);
        format!("{}/{}.{}", self.prefix, Uuid::new_v4(), ext)
    }

    /// Upload and return the public URL of the new object.
    #[instrument(skip(self, token, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    pub async fn upload(&self, token: &AccessToken, file: LocalFile) -> Result<String, ServiceError> {
        let key = self.storage_key(&file.file_name);
        self.storage
            .upload(token, &self.bucket, &key, file.bytes, file.content_type.as_deref())
            .await?;
        let url = self.storage.public_url(&self.bucket, &key);
        info!(%key, "image uploaded");
        Ok(url)
    }
}
