use thiserror::Error;

use crate::db_types::{CustomerUpdate, FullCustomer, NewCustomer};

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Customer {0} does not exist")]
    CustomerNotFound(i64),
    #[error("The update contains no fields")]
    EmptyUpdate,
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        CustomerApiError::DatabaseError(e.to_string())
    }
}

/// Storage operations for customers and their profiles. Everything is scoped to a store;
/// a customer id from another store behaves as if it does not exist.
#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    async fn insert_customer(&self, store_id: i64, customer: &NewCustomer) -> Result<FullCustomer, CustomerApiError>;

    async fn fetch_customer(&self, store_id: i64, customer_id: i64) -> Result<Option<FullCustomer>, CustomerApiError>;

    async fn fetch_customers(&self, store_id: i64) -> Result<Vec<FullCustomer>, CustomerApiError>;

    async fn update_customer(
        &self,
        store_id: i64,
        customer_id: i64,
        update: &CustomerUpdate,
    ) -> Result<FullCustomer, CustomerApiError>;

    async fn delete_customer(&self, store_id: i64, customer_id: i64) -> Result<(), CustomerApiError>;
}
