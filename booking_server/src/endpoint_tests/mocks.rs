use bms_common::EmailAddress;
use booking_engine::{
    db_types::{
        FederatedStaff,
        FullStaff,
        NewStaff,
        NewStore,
        Staff,
        StaffAccess,
        StaffCredential,
        StaffUpdate,
        Store,
        StoreUpdate,
    },
    traits::{AuthApiError, AuthManagement, StaffApiError, StaffManagement, StoreApiError, StoreManagement},
};
use idp_tools::{IdpApiError, JwtKey, KeyProvider};
use mockall::mock;

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn fetch_staff_by_email(&self, email: &EmailAddress) -> Result<Option<Staff>, AuthApiError>;
        async fn fetch_credential_by_email(&self, email: &EmailAddress) -> Result<Option<StaffCredential>, AuthApiError>;
        async fn fetch_staff_by_external_id(&self, external_id: &str) -> Result<Option<Staff>, AuthApiError>;
        async fn create_federated_staff(&self, staff: &FederatedStaff) -> Result<Staff, AuthApiError>;
        async fn update_password_hash(&self, email: &EmailAddress, hash: &str) -> Result<(), AuthApiError>;
        async fn fetch_access_for_staff(&self, staff_id: i64) -> Result<StaffAccess, AuthApiError>;
    }
}

mock! {
    pub StaffManager {}
    impl StaffManagement for StaffManager {
        async fn insert_staff(&self, store_id: i64, staff: &NewStaff, password_hash: &str) -> Result<FullStaff, StaffApiError>;
        async fn fetch_staff(&self, store_id: i64, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError>;
        async fn fetch_staff_by_id(&self, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError>;
        async fn fetch_staff_for_store(&self, store_id: i64) -> Result<Vec<FullStaff>, StaffApiError>;
        async fn update_staff(&self, store_id: i64, staff_id: i64, update: &StaffUpdate) -> Result<FullStaff, StaffApiError>;
        async fn update_staff_by_id(&self, staff_id: i64, update: &StaffUpdate) -> Result<FullStaff, StaffApiError>;
        async fn delete_staff(&self, store_id: i64, staff_id: i64) -> Result<(), StaffApiError>;
    }
}

mock! {
    pub StoreManager {}
    impl StoreManagement for StoreManager {
        async fn insert_store(&self, store: &NewStore) -> Result<Store, StoreApiError>;
        async fn fetch_store(&self, store_id: i64) -> Result<Option<Store>, StoreApiError>;
        async fn fetch_stores(&self) -> Result<Vec<Store>, StoreApiError>;
        async fn update_store(&self, store_id: i64, update: &StoreUpdate) -> Result<Store, StoreApiError>;
    }
}

mock! {
    pub Provider {}
    impl KeyProvider for Provider {
        async fn fetch_published_keys(&self) -> Result<Vec<JwtKey>, IdpApiError>;
    }
}
