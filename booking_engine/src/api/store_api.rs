//! Unified API for the tenant directory.

use std::fmt::Debug;

use crate::{
    db_types::{NewStore, Store, StoreUpdate},
    traits::{StoreApiError, StoreManagement},
};

pub struct StoreApi<B> {
    db: B,
}

impl<B: Debug> Debug for StoreApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreApi ({:?})", self.db)
    }
}

impl<B> StoreApi<B>
where B: StoreManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_store(&self, store: &NewStore) -> Result<Store, StoreApiError> {
        self.db.insert_store(store).await
    }

    /// Fetches a store by id. `None` if no store exists with that id.
    pub async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, StoreApiError> {
        self.db.fetch_store(store_id).await
    }

    pub async fn fetch_stores(&self) -> Result<Vec<Store>, StoreApiError> {
        self.db.fetch_stores().await
    }

    /// Applies the non-`None` fields of the update and returns the new record. An update
    /// with every field `None` is rejected with [`StoreApiError::EmptyUpdate`].
    pub async fn update_store(&self, store_id: i64, update: &StoreUpdate) -> Result<Store, StoreApiError> {
        if update.is_empty() {
            return Err(StoreApiError::EmptyUpdate);
        }
        self.db.update_store(store_id, update).await
    }
}
