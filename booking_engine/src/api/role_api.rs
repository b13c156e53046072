//! Unified API for roles and permission grants.

use std::fmt::Debug;

use crate::{
    db_types::{FullRole, NewRole, Permission, PermissionRecord, RoleRecord},
    traits::{RoleApiError, RoleManagement},
};

pub struct RoleApi<B> {
    db: B,
}

impl<B: Debug> Debug for RoleApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RoleApi ({:?})", self.db)
    }
}

impl<B> RoleApi<B>
where B: RoleManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a role in a store. Role names are unique per store.
    pub async fn create_role(&self, store_id: i64, role: &NewRole) -> Result<RoleRecord, RoleApiError> {
        self.db.insert_role(store_id, role).await
    }

    /// Fetches a role together with its granted permissions.
    pub async fn fetch_role(&self, store_id: i64, role_id: i64) -> Result<Option<FullRole>, RoleApiError> {
        self.db.fetch_role(store_id, role_id).await
    }

    pub async fn fetch_roles(&self, store_id: i64) -> Result<Vec<RoleRecord>, RoleApiError> {
        self.db.fetch_roles(store_id).await
    }

    /// Replaces the role's grants with exactly the given set. An empty set revokes
    /// everything.
    pub async fn replace_role_permissions(
        &self,
        store_id: i64,
        role_id: i64,
        permissions: &[Permission],
    ) -> Result<FullRole, RoleApiError> {
        self.db.replace_role_permissions(store_id, role_id, permissions).await
    }

    /// Deletes a role. Staff holding it fall back to no role and lose API access.
    pub async fn delete_role(&self, store_id: i64, role_id: i64) -> Result<(), RoleApiError> {
        self.db.delete_role(store_id, role_id).await
    }

    /// The fixed permission catalogue, seeded by migration.
    pub async fn fetch_permission_catalogue(&self) -> Result<Vec<PermissionRecord>, RoleApiError> {
        self.db.fetch_permission_catalogue().await
    }
}
