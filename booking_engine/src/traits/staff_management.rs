use thiserror::Error;

use crate::db_types::{FullStaff, NewStaff, StaffUpdate};

#[derive(Debug, Clone, Error)]
pub enum StaffApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Staff member {0} does not exist")]
    StaffNotFound(i64),
    #[error("Role not found")]
    RoleNotFound,
    #[error("A staff member with this email address already exists")]
    DuplicateEmail,
    #[error("The staff member has no profile; supply at least a name and mail address")]
    ProfileMissing,
    #[error("The update contains no fields")]
    EmptyUpdate,
    #[error("Could not hash the password: {0}")]
    PasswordHash(String),
}

impl From<sqlx::Error> for StaffApiError {
    fn from(e: sqlx::Error) -> Self {
        StaffApiError::DatabaseError(e.to_string())
    }
}

/// Storage operations for staff records and their profiles.
#[allow(async_fn_in_trait)]
pub trait StaffManagement {
    /// Insert a staff row and its profile in one transaction. The role must belong to the
    /// given store ([`StaffApiError::RoleNotFound`] otherwise) and the email address must
    /// be unused ([`StaffApiError::DuplicateEmail`]).
    async fn insert_staff(&self, store_id: i64, staff: &NewStaff, password_hash: &str)
        -> Result<FullStaff, StaffApiError>;

    /// Fetch a staff member scoped to a store.
    async fn fetch_staff(&self, store_id: i64, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError>;

    /// Fetch a staff member by id alone. Used for self-service lookups, where unassigned
    /// (store-less) staff must still be able to see their own record.
    async fn fetch_staff_by_id(&self, staff_id: i64) -> Result<Option<FullStaff>, StaffApiError>;

    async fn fetch_staff_for_store(&self, store_id: i64) -> Result<Vec<FullStaff>, StaffApiError>;

    /// Apply the non-`None` fields of the update to a staff member of the given store.
    /// A `role_id` in the update must reference a role of the same store.
    async fn update_staff(&self, store_id: i64, staff_id: i64, update: &StaffUpdate)
        -> Result<FullStaff, StaffApiError>;

    /// Apply profile fields of the update by staff id alone. Role changes are not applied
    /// through this path.
    async fn update_staff_by_id(&self, staff_id: i64, update: &StaffUpdate) -> Result<FullStaff, StaffApiError>;

    /// Delete a staff member of the given store. The profile row and event assignments go
    /// with it.
    async fn delete_staff(&self, store_id: i64, staff_id: i64) -> Result<(), StaffApiError>;
}
