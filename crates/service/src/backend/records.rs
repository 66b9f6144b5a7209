use async_trait::async_trait;
use models::{Collection, RecordId};
use serde_json::Value;

use super::identity::AccessToken;
use crate::errors::ServiceError;

/// Row-level CRUD against the external record store. Rows are JSON objects
/// whose shape is owned by the store; typed access goes through
/// [`crate::repository::Repository`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows, ascending by `order_index`; equal positions in arrival order.
    async fn list(&self, token: &AccessToken, collection: Collection) -> Result<Vec<Value>, ServiceError>;
    /// Insert a row without id; returns the stored row including its id.
    async fn insert(&self, token: &AccessToken, collection: Collection, row: Value) -> Result<Value, ServiceError>;
    /// Overwrite the given columns of the row with `id`.
    async fn update(&self, token: &AccessToken, collection: Collection, id: &RecordId, row: Value) -> Result<(), ServiceError>;
    async fn delete_by_id(&self, token: &AccessToken, collection: Collection, id: &RecordId) -> Result<(), ServiceError>;
}

/// Orders rows the way the hosted store does for `order=order_index.asc`:
/// ascending, nulls last, stable.
pub(crate) fn order_rows(rows: &mut [Value]) {
    rows.sort_by(|a, b| {
        let key = |v: &Value| v.get("order_index").and_then(Value::as_i64);
        match (key(a), key(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

/// Simple in-memory record store for tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryRecordStore {
        rows: Mutex<HashMap<Collection, Vec<Value>>>,
        next_id: AtomicU64,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl MemoryRecordStore {
        /// When set, every call fails with a remote 500.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Number of calls received, including failed ones.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Raw rows in arrival order.
        pub fn rows(&self, collection: Collection) -> Vec<Value> {
            self.rows.lock().unwrap().get(&collection).cloned().unwrap_or_default()
        }

        fn enter(&self) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::Remote { status: 500, message: "store unavailable".into() });
            }
            Ok(())
        }
    }

    fn matches(row: &Value, id: &RecordId) -> bool {
        match row.get("id") {
            Some(Value::Number(n)) => n.to_string() == id.as_str(),
            Some(Value::String(s)) => s == id.as_str(),
            _ => false,
        }
    }

    #[async_trait]
    impl RecordStore for MemoryRecordStore {
        async fn list(&self, _token: &AccessToken, collection: Collection) -> Result<Vec<Value>, ServiceError> {
            self.enter()?;
            let mut rows = self.rows(collection);
            order_rows(&mut rows);
            Ok(rows)
        }

        async fn insert(&self, _token: &AccessToken, collection: Collection, mut row: Value) -> Result<Value, ServiceError> {
            self.enter()?;
            let obj = row
                .as_object_mut()
                .ok_or_else(|| ServiceError::Validation("row must be a JSON object".into()))?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            obj.insert("id".into(), Value::from(id));
            self.rows.lock().unwrap().entry(collection).or_default().push(row.clone());
            Ok(row)
        }

        async fn update(&self, _token: &AccessToken, collection: Collection, id: &RecordId, row: Value) -> Result<(), ServiceError> {
            self.enter()?;
            let patch = row
                .as_object()
                .ok_or_else(|| ServiceError::Validation("row must be a JSON object".into()))?;
            let mut all = self.rows.lock().unwrap();
            for existing in all.entry(collection).or_default().iter_mut().filter(|r| matches(r, id)) {
                if let Some(obj) = existing.as_object_mut() {
                    for (k, v) in patch {
                        obj.insert(k.clone(), v.clone());
                    }
                }
            }
            Ok(())
        }

        async fn delete_by_id(&self, _token: &AccessToken, collection: Collection, id: &RecordId) -> Result<(), ServiceError> {
            self.enter()?;
            self.rows.lock().unwrap().entry(collection).or_default().retain(|r| !matches(r, id));
            Ok(())
        }
    }
}
