use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::{Collection, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::backend::records::order_rows;
use crate::backend::{AccessToken, RecordStore};
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// A row plus its arrival sequence, which breaks `order_index` ties.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredRow {
    seq: u64,
    row: Value,
}

/// File-backed record store: one JSON file per collection under `data_dir`
/// (`projects.json`, `services.json`), ids are UUIDs.
pub struct FileRecordStore {
    tables: HashMap<Collection, Arc<JsonMapStore<String, StoredRow>>>,
}

impl FileRecordStore {
    pub async fn open<P: Into<PathBuf>>(data_dir: P) -> Result<Self, ServiceError> {
        let dir = data_dir.into();
        let mut tables = HashMap::new();
        for collection in Collection::ALL {
            let path = dir.join(format!("{}.json", collection.as_str()));
            tables.insert(collection, JsonMapStore::open(path).await?);
        }
        Ok(Self { tables })
    }

    fn table(&self, collection: Collection) -> Result<&JsonMapStore<String, StoredRow>, ServiceError> {
        self.tables
            .get(&collection)
            .map(Arc::as_ref)
            .ok_or_else(|| ServiceError::not_found(collection.as_str()))
    }
}

fn as_object(row: Value) -> Result<serde_json::Map<String, Value>, ServiceError> {
    match row {
        Value::Object(obj) => Ok(obj),
        _ => Err(ServiceError::Validation("row must be a JSON object".into())),
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    #[instrument(skip(self, _token))]
    async fn list(&self, _token: &AccessToken, collection: Collection) -> Result<Vec<Value>, ServiceError> {
        let mut stored = self.table(collection)?.values().await;
        stored.sort_by_key(|s| s.seq);
        let mut rows: Vec<Value> = stored.into_iter().map(|s| s.row).collect();
        order_rows(&mut rows);
        Ok(rows)
    }

    #[instrument(skip(self, _token, row))]
    async fn insert(&self, _token: &AccessToken, collection: Collection, row: Value) -> Result<Value, ServiceError> {
        let mut obj = as_object(row)?;
        let id = Uuid::new_v4().to_string();
        obj.insert("id".into(), Value::String(id.clone()));
        obj.insert("created_at".into(), Value::String(chrono::Utc::now().to_rfc3339()));
        let row = Value::Object(obj);

        let stored = row.clone();
        self.table(collection)?
            .update_map(move |map| {
                let seq = map.values().map(|s| s.seq).max().map_or(0, |m| m + 1);
                map.insert(id, StoredRow { seq, row: stored });
                Ok(())
            })
            .await?;
        debug!(collection = %collection, "row inserted");
        Ok(row)
    }

    #[instrument(skip(self, _token, row))]
    async fn update(&self, _token: &AccessToken, collection: Collection, id: &RecordId, row: Value) -> Result<(), ServiceError> {
        let patch = as_object(row)?;
        let key = id.as_str().to_string();
        self.table(collection)?
            .update_map(move |map| {
                let existing = map.get_mut(&key).ok_or_else(|| ServiceError::not_found("record"))?;
                if let Value::Object(obj) = &mut existing.row {
                    for (k, v) in patch {
                        if k != "id" {
                            obj.insert(k, v);
                        }
                    }
                }
                Ok(())
            })
            .await
    }

    #[instrument(skip(self, _token))]
    async fn delete_by_id(&self, _token: &AccessToken, collection: Collection, id: &RecordId) -> Result<(), ServiceError> {
        // Deleting an absent id matches zero rows, which is not an error.
        self.table(collection)?.remove(&id.as_str().to_string()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> (FileRecordStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("console_rows_{}", Uuid::new_v4()));
        (FileRecordStore::open(&dir).await.expect("store init"), dir)
    }

    #[tokio::test]
    async fn list_orders_by_index_then_arrival() -> Result<(), anyhow::Error> {
        let (store, dir) = setup().await;
        let t = AccessToken::new("local");
        for (title, order) in [("a", json!(1)), ("b", json!(0)), ("c", json!(1)), ("d", Value::Null)] {
            store.insert(&t, Collection::Projects, json!({"title": title, "order_index": order})).await?;
        }
        let titles: Vec<String> = store
            .list(&t, Collection::Projects)
            .await?
            .iter()
            .map(|r| r["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, ["b", "a", "c", "d"]);

        // reopen from disk keeps arrival order
        let reopened = FileRecordStore::open(&dir).await?;
        assert_eq!(reopened.list(&t, Collection::Projects).await?.len(), 4);
        assert!(reopened.list(&t, Collection::Services).await?.is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_by_id() -> Result<(), anyhow::Error> {
        let (store, dir) = setup().await;
        let t = AccessToken::new("local");
        let row = store.insert(&t, Collection::Services, json!({"title": "x", "icon": "*", "order_index": 0})).await?;
        let id: RecordId = serde_json::from_value(row["id"].clone())?;

        store.update(&t, Collection::Services, &id, json!({"title": "y", "id": "hijack"})).await?;
        let rows = store.list(&t, Collection::Services).await?;
        assert_eq!(rows[0]["title"], "y");
        assert_eq!(rows[0]["icon"], "*");
        assert_eq!(rows[0]["id"], json!(id.as_str()));

        let missing = RecordId::new("nope");
        assert!(matches!(
            store.update(&t, Collection::Services, &missing, json!({"title": "z"})).await,
            Err(ServiceError::NotFound(_))
        ));

        store.delete_by_id(&t, Collection::Services, &id).await?;
        assert!(store.list(&t, Collection::Services).await?.is_empty());
        store.delete_by_id(&t, Collection::Services, &id).await?;

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
