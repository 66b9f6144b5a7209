use async_trait::async_trait;
use models::{Collection, RecordId};
use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use super::{ensure_success, SupabaseClient};
use crate::backend::{AccessToken, RecordStore};
use crate::errors::ServiceError;

/// PostgREST row access under `/rest/v1/{collection}`.
#[derive(Clone)]
pub struct SupabaseRest {
    client: SupabaseClient,
}

impl SupabaseRest {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table(collection: Collection) -> String {
        format!("/rest/v1/{}", collection.as_str())
    }

    fn id_filter(id: &RecordId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id.as_str()))]
    }
}

#[async_trait]
impl RecordStore for SupabaseRest {
    #[instrument(skip(self, token))]
    async fn list(&self, token: &AccessToken, collection: Collection) -> Result<Vec<Value>, ServiceError> {
        let resp = self
            .client
            .request(Method::GET, &Self::table(collection), Some(token))
            .query(&[("select", "*"), ("order", "order_index.asc")])
            .send()
            .await?;
        let rows = ensure_success(resp).await?.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    #[instrument(skip(self, token, row))]
    async fn insert(&self, token: &AccessToken, collection: Collection, row: Value) -> Result<Value, ServiceError> {
        let resp = self
            .client
            .request(Method::POST, &Self::table(collection), Some(token))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        let mut rows = ensure_success(resp).await?.json::<Vec<Value>>().await?;
        if rows.is_empty() {
            return Err(ServiceError::Decode("insert returned no row".into()));
        }
        Ok(rows.swap_remove(0))
    }

    #[instrument(skip(self, token, row))]
    async fn update(&self, token: &AccessToken, collection: Collection, id: &RecordId, row: Value) -> Result<(), ServiceError> {
        let resp = self
            .client
            .request(Method::PATCH, &Self::table(collection), Some(token))
            .query(&Self::id_filter(id))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn delete_by_id(&self, token: &AccessToken, collection: Collection, id: &RecordId) -> Result<(), ServiceError> {
        let resp = self
            .client
            .request(Method::DELETE, &Self::table(collection), Some(token))
            .query(&Self::id_filter(id))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}
