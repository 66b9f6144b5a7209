use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use super::{encode_path, ensure_success, SupabaseClient};
use crate::backend::{AccessToken, ObjectStorage};
use crate::errors::ServiceError;

/// Storage API under `/storage/v1`.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: SupabaseClient,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, token, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        token: &AccessToken,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), ServiceError> {
        let object = format!("/storage/v1/object/{}/{}", encode_path(bucket), encode_path(path));
        let resp = self
            .client
            .request(Method::POST, &object, Some(token))
            .header("content-type", content_type.unwrap_or("application/octet-stream"))
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.base_url(),
            encode_path(bucket),
            encode_path(path)
        )
    }
}
