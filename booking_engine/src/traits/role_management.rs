use thiserror::Error;

use crate::db_types::{FullRole, NewRole, Permission, PermissionRecord, RoleRecord};

#[derive(Debug, Clone, Error)]
pub enum RoleApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Role not found")]
    RoleNotFound,
    #[error("Store {0} does not exist")]
    StoreNotFound(i64),
    #[error("A role named '{0}' already exists in this store")]
    DuplicateRoleName(String),
}

impl From<sqlx::Error> for RoleApiError {
    fn from(e: sqlx::Error) -> Self {
        RoleApiError::DatabaseError(e.to_string())
    }
}

/// Storage operations for store-scoped roles and their permission grants. The permission
/// catalogue itself is fixed reference data seeded by migration.
#[allow(async_fn_in_trait)]
pub trait RoleManagement {
    async fn insert_role(&self, store_id: i64, role: &NewRole) -> Result<RoleRecord, RoleApiError>;

    async fn fetch_role(&self, store_id: i64, role_id: i64) -> Result<Option<FullRole>, RoleApiError>;

    async fn fetch_roles(&self, store_id: i64) -> Result<Vec<RoleRecord>, RoleApiError>;

    /// Replace the role's grants with exactly the given set.
    async fn replace_role_permissions(
        &self,
        store_id: i64,
        role_id: i64,
        permissions: &[Permission],
    ) -> Result<FullRole, RoleApiError>;

    async fn delete_role(&self, store_id: i64, role_id: i64) -> Result<(), RoleApiError>;

    async fn fetch_permission_catalogue(&self) -> Result<Vec<PermissionRecord>, RoleApiError>;
}
