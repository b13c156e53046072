//! Unified API for customer administration.

use std::fmt::Debug;

use crate::{
    db_types::{CustomerUpdate, FullCustomer, NewCustomer},
    traits::{CustomerApiError, CustomerManagement},
};

pub struct CustomerApi<B> {
    db: B,
}

impl<B: Debug> Debug for CustomerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomerApi ({:?})", self.db)
    }
}

impl<B> CustomerApi<B>
where B: CustomerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_customer(&self, store_id: i64, customer: &NewCustomer) -> Result<FullCustomer, CustomerApiError> {
        self.db.insert_customer(store_id, customer).await
    }

    pub async fn fetch_customer(&self, store_id: i64, customer_id: i64) -> Result<Option<FullCustomer>, CustomerApiError> {
        self.db.fetch_customer(store_id, customer_id).await
    }

    pub async fn fetch_customers(&self, store_id: i64) -> Result<Vec<FullCustomer>, CustomerApiError> {
        self.db.fetch_customers(store_id).await
    }

    /// Applies the non-`None` fields of the update and returns the new record.
    pub async fn update_customer(
        &self,
        store_id: i64,
        customer_id: i64,
        update: &CustomerUpdate,
    ) -> Result<FullCustomer, CustomerApiError> {
        if update.is_empty() {
            return Err(CustomerApiError::EmptyUpdate);
        }
        self.db.update_customer(store_id, customer_id, update).await
    }

    /// Deletes a customer. Their bookings go with them.
    pub async fn delete_customer(&self, store_id: i64, customer_id: i64) -> Result<(), CustomerApiError> {
        self.db.delete_customer(store_id, customer_id).await
    }
}
