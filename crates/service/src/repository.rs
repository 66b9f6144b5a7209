use std::{marker::PhantomData, sync::Arc};

use models::{Record, RecordId};
use tracing::instrument;

use crate::backend::{AccessToken, RecordStore};
use crate::errors::ServiceError;

/// Typed view of one collection on top of the row store.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use models::{OrderIndex, Project, ProjectDraft};
/// use service::backend::{AccessToken, records::mock::MemoryRecordStore};
/// use service::repository::Repository;
///
/// let store = Arc::new(MemoryRecordStore::default());
/// let repo = Repository::<Project>::new(store);
/// let token = AccessToken::new("t");
/// let draft = ProjectDraft { title: "Alpha".into(), description: "d".into(), order_index: OrderIndex::new(2), ..Default::default() };
/// let created = tokio_test::block_on(repo.insert(&token, &draft)).unwrap();
/// assert_eq!(created.title, "Alpha");
/// let all = tokio_test::block_on(repo.list(&token)).unwrap();
/// assert_eq!(all.len(), 1);
/// ```
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), _record: PhantomData }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, _record: PhantomData }
    }

    #[instrument(skip_all, fields(collection = %T::COLLECTION))]
    pub async fn list(&self, token: &AccessToken) -> Result<Vec<T>, ServiceError> {
        let rows = self.store.list(token, T::COLLECTION).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(ServiceError::from))
            .collect()
    }

    #[instrument(skip_all, fields(collection = %T::COLLECTION))]
    pub async fn insert(&self, token: &AccessToken, draft: &T::Draft) -> Result<T, ServiceError> {
        let row = serde_json::to_value(draft)?;
        let stored = self.store.insert(token, T::COLLECTION, row).await?;
        Ok(serde_json::from_value(stored)?)
    }

    #[instrument(skip_all, fields(collection = %T::COLLECTION, %id))]
    pub async fn update(&self, token: &AccessToken, id: &RecordId, draft: &T::Draft) -> Result<(), ServiceError> {
        let row = serde_json::to_value(draft)?;
        self.store.update(token, T::COLLECTION, id, row).await
    }

    #[instrument(skip_all, fields(collection = %T::COLLECTION, %id))]
    pub async fn delete(&self, token: &AccessToken, id: &RecordId) -> Result<(), ServiceError> {
        self.store.delete_by_id(token, T::COLLECTION, id).await
    }
}
