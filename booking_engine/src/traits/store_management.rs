use thiserror::Error;

use crate::db_types::{NewStore, Store, StoreUpdate};

#[derive(Debug, Clone, Error)]
pub enum StoreApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Store {0} does not exist")]
    StoreNotFound(i64),
    #[error("The update contains no fields")]
    EmptyUpdate,
}

impl From<sqlx::Error> for StoreApiError {
    fn from(e: sqlx::Error) -> Self {
        StoreApiError::DatabaseError(e.to_string())
    }
}

/// Storage operations for the tenant directory.
#[allow(async_fn_in_trait)]
pub trait StoreManagement {
    async fn insert_store(&self, store: &NewStore) -> Result<Store, StoreApiError>;

    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, StoreApiError>;

    async fn fetch_stores(&self) -> Result<Vec<Store>, StoreApiError>;

    /// Apply the non-`None` fields of the update. [`StoreApiError::StoreNotFound`] if the
    /// store does not exist.
    async fn update_store(&self, store_id: i64, update: &StoreUpdate) -> Result<Store, StoreApiError>;
}
