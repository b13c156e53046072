//! Unified API for staff administration.

use std::fmt::Debug;

use crate::{
    db_types::{FullStaff, NewStaff, StaffUpdate},
    helpers::hash_password,
    traits::{StaffApiError, StaffManagement},
};

pub struct StaffApi<B> {
    db: B,
}

impl<B: Debug> Debug for StaffApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StaffApi ({:?})", self.db)
    }
}

impl<B> StaffApi<B>
where B: StaffManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a staff member with a profile and a local login credential. The plaintext
    /// password is hashed here; the backend only ever sees the digest.
    pub async fn create_staff(&self, store_id: i64, staff: &NewStaff) -> Result<FullStaff, StaffApiError> {
        let hash = hash_password(staff.password.reveal()).map_err(|e| StaffApiError::PasswordHash(e.to_string()))?;
        self.db.insert_staff(store_id, staff, &hash).await
    }

    pub async fn fetch_staff(&self, store_id: i64, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError> {
        self.db.fetch_staff(store_id, staff_id).await
    }

    /// Fetches a staff member by id alone, for self-service lookups. Unassigned staff have
    /// no store, so the scoped fetch would never find them.
    pub async fn fetch_staff_by_id(&self, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError> {
        self.db.fetch_staff_by_id(staff_id).await
    }

    pub async fn fetch_staff_for_store(&self, store_id: i64) -> Result<Vec<FullStaff>, StaffApiError> {
        self.db.fetch_staff_for_store(store_id).await
    }

    /// Applies the non-`None` fields of the update to a staff member of the given store.
    pub async fn update_staff(
        &self,
        store_id: i64,
        staff_id: i64,
        update: &StaffUpdate,
    ) -> Result<FullStaff, StaffApiError> {
        if update.is_empty() {
            return Err(StaffApiError::EmptyUpdate);
        }
        self.db.update_staff(store_id, staff_id, update).await
    }

    /// Self-service profile update. Role assignments are silently dropped; staff cannot
    /// change their own role through this path.
    pub async fn update_my_profile(&self, staff_id: i64, update: &StaffUpdate) -> Result<FullStaff, StaffApiError> {
        let update = StaffUpdate { role_id: None, ..update.clone() };
        if update.is_empty() {
            return Err(StaffApiError::EmptyUpdate);
        }
        self.db.update_staff_by_id(staff_id, &update).await
    }

    pub async fn delete_staff(&self, store_id: i64, staff_id: i64) -> Result<(), StaffApiError> {
        self.db.delete_staff(store_id, staff_id).await
    }
}
