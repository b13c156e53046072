//! `SqliteDatabase` is a concrete implementation of a booking engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use bms_common::EmailAddress;
use log::*;
use sqlx::SqlitePool;

use super::db::{auth, customers, db_url, events, new_pool, roles, staff, stores};
use crate::{
    db_types::{
        CustomerUpdate,
        EventRecord,
        EventUpdate,
        FederatedStaff,
        FullCustomer,
        FullRole,
        FullStaff,
        NewCustomer,
        NewEvent,
        NewRole,
        NewStaff,
        NewStore,
        Permission,
        PermissionRecord,
        RoleRecord,
        Staff,
        StaffAccess,
        StaffCredential,
        StaffUpdate,
        Store,
        StoreUpdate,
    },
    traits::{
        AuthApiError,
        AuthManagement,
        CustomerApiError,
        CustomerManagement,
        EventApiError,
        EventManagement,
        RoleApiError,
        RoleManagement,
        StaffApiError,
        StaffManagement,
        StoreApiError,
        StoreManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_staff_by_email(&self, email: &EmailAddress) -> Result<Option<Staff>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::staff_by_email(email, &mut conn).await
    }

    async fn fetch_credential_by_email(&self, email: &EmailAddress) -> Result<Option<StaffCredential>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::credential_by_email(email, &mut conn).await
    }

    async fn fetch_staff_by_external_id(&self, external_id: &str) -> Result<Option<Staff>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::staff_by_external_id(external_id, &mut conn).await
    }

    async fn create_federated_staff(&self, staff: &FederatedStaff) -> Result<Staff, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let row = auth::insert_federated_staff(staff, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Federated subject [{}] is now staff #{}", staff.external_id, row.id);
        Ok(row)
    }

    async fn update_password_hash(&self, email: &EmailAddress, hash: &str) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::update_password_hash(email, hash, &mut conn).await
    }

    async fn fetch_access_for_staff(&self, staff_id: i64) -> Result<StaffAccess, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::access_for_staff(staff_id, &mut conn).await
    }
}

impl StoreManagement for SqliteDatabase {
    async fn insert_store(&self, store: &NewStore) -> Result<Store, StoreApiError> {
        let mut conn = self.pool.acquire().await?;
        let store = stores::insert_store(store, &mut conn).await?;
        debug!("🗃️ Store #{} ({}) has been created", store.id, store.name);
        Ok(store)
    }

    async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, StoreApiError> {
        let mut conn = self.pool.acquire().await?;
        stores::fetch_store(store_id, &mut conn).await
    }

    async fn fetch_stores(&self) -> Result<Vec<Store>, StoreApiError> {
        let mut conn = self.pool.acquire().await?;
        stores::fetch_stores(&mut conn).await
    }

    async fn update_store(&self, store_id: i64, update: &StoreUpdate) -> Result<Store, StoreApiError> {
        let mut conn = self.pool.acquire().await?;
        stores::update_store(store_id, update, &mut conn).await
    }
}

impl StaffManagement for SqliteDatabase {
    async fn insert_staff(
        &self,
        store_id: i64,
        staff: &NewStaff,
        password_hash: &str,
    ) -> Result<FullStaff, StaffApiError> {
        let mut tx = self.pool.begin().await?;
        let full = staff::insert_staff(store_id, staff, password_hash, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Staff #{} has been created in store #{store_id}", full.staff.id);
        Ok(full)
    }

    async fn fetch_staff(&self, store_id: i64, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        staff::full_staff_in_store(store_id, staff_id, &mut conn).await
    }

    async fn fetch_staff_by_id(&self, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        staff::full_staff_by_id(staff_id, &mut conn).await
    }

    async fn fetch_staff_for_store(&self, store_id: i64) -> Result<Vec<FullStaff>, StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        staff::staff_for_store(store_id, &mut conn).await
    }

    async fn update_staff(
        &self,
        store_id: i64,
        staff_id: i64,
        update: &StaffUpdate,
    ) -> Result<FullStaff, StaffApiError> {
        let mut tx = self.pool.begin().await?;
        let full = staff::update_staff(store_id, staff_id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(full)
    }

    async fn update_staff_by_id(&self, staff_id: i64, update: &StaffUpdate) -> Result<FullStaff, StaffApiError> {
        let mut tx = self.pool.begin().await?;
        let full = staff::update_staff_unscoped(staff_id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(full)
    }

    async fn delete_staff(&self, store_id: i64, staff_id: i64) -> Result<(), StaffApiError> {
        let mut conn = self.pool.acquire().await?;
        staff::delete_staff(store_id, staff_id, &mut conn).await?;
        debug!("🗃️ Staff #{staff_id} has been deleted from store #{store_id}");
        Ok(())
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn insert_customer(&self, store_id: i64, customer: &NewCustomer) -> Result<FullCustomer, CustomerApiError> {
        let mut tx = self.pool.begin().await?;
        let full = customers::insert_customer(store_id, customer, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Customer #{} has been created in store #{store_id}", full.customer.id);
        Ok(full)
    }

    async fn fetch_customer(&self, store_id: i64, customer_id: i64) -> Result<Option<FullCustomer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::full_customer_in_store(store_id, customer_id, &mut conn).await
    }

    async fn fetch_customers(&self, store_id: i64) -> Result<Vec<FullCustomer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::customers_for_store(store_id, &mut conn).await
    }

    async fn update_customer(
        &self,
        store_id: i64,
        customer_id: i64,
        update: &CustomerUpdate,
    ) -> Result<FullCustomer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::update_customer(store_id, customer_id, update, &mut conn).await
    }

    async fn delete_customer(&self, store_id: i64, customer_id: i64) -> Result<(), CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::delete_customer(store_id, customer_id, &mut conn).await?;
        debug!("🗃️ Customer #{customer_id} has been deleted from store #{store_id}");
        Ok(())
    }
}

impl EventManagement for SqliteDatabase {
    async fn insert_event(&self, store_id: i64, event: &NewEvent) -> Result<EventRecord, EventApiError> {
        let mut tx = self.pool.begin().await?;
        let record = events::insert_event(store_id, event, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Event #{} ({} min) has been booked in store #{store_id}",
            record.event.id, record.event.duration_by_minutes
        );
        Ok(record)
    }

    async fn fetch_event(&self, store_id: i64, event_id: i64) -> Result<Option<EventRecord>, EventApiError> {
        let mut conn = self.pool.acquire().await?;
        events::fetch_event(store_id, event_id, &mut conn).await
    }

    async fn fetch_events(&self, store_id: i64) -> Result<Vec<EventRecord>, EventApiError> {
        let mut conn = self.pool.acquire().await?;
        events::fetch_events(store_id, &mut conn).await
    }

    async fn update_event(
        &self,
        store_id: i64,
        event_id: i64,
        update: &EventUpdate,
    ) -> Result<EventRecord, EventApiError> {
        let mut tx = self.pool.begin().await?;
        let record = events::update_event(store_id, event_id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn delete_event(&self, store_id: i64, event_id: i64) -> Result<(), EventApiError> {
        let mut conn = self.pool.acquire().await?;
        events::delete_event(store_id, event_id, &mut conn).await?;
        debug!("🗃️ Event #{event_id} has been deleted from store #{store_id}");
        Ok(())
    }
}

impl RoleManagement for SqliteDatabase {
    async fn insert_role(&self, store_id: i64, role: &NewRole) -> Result<RoleRecord, RoleApiError> {
        let mut conn = self.pool.acquire().await?;
        let record = roles::insert_role(store_id, role, &mut conn).await?;
        debug!("🗃️ Role #{} ({}) has been created in store #{store_id}", record.id, record.name);
        Ok(record)
    }

    async fn fetch_role(&self, store_id: i64, role_id: i64) -> Result<Option<FullRole>, RoleApiError> {
        let mut conn = self.pool.acquire().await?;
        roles::full_role(store_id, role_id, &mut conn).await
    }

    async fn fetch_roles(&self, store_id: i64) -> Result<Vec<RoleRecord>, RoleApiError> {
        let mut conn = self.pool.acquire().await?;
        roles::fetch_roles(store_id, &mut conn).await
    }

    async fn replace_role_permissions(
        &self,
        store_id: i64,
        role_id: i64,
        permissions: &[Permission],
    ) -> Result<FullRole, RoleApiError> {
        let mut tx = self.pool.begin().await?;
        let full = roles::replace_role_permissions(store_id, role_id, permissions, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Role #{role_id} now grants {:?}", full.permissions.iter().map(|p| p.function).collect::<Vec<_>>());
        Ok(full)
    }

    async fn delete_role(&self, store_id: i64, role_id: i64) -> Result<(), RoleApiError> {
        let mut conn = self.pool.acquire().await?;
        roles::delete_role(store_id, role_id, &mut conn).await?;
        debug!("🗃️ Role #{role_id} has been deleted from store #{store_id}");
        Ok(())
    }

    async fn fetch_permission_catalogue(&self) -> Result<Vec<PermissionRecord>, RoleApiError> {
        let mut conn = self.pool.acquire().await?;
        roles::fetch_permission_catalogue(&mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
