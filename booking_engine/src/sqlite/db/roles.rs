//! Sqlite database operations for roles and permission grants.
//!
//! The `permissions` table is a fixed catalogue seeded by migration. Roles are rows scoped
//! to a store; grants are rows in `role_permissions` linking the two.

use sqlx::SqliteConnection;

use crate::{
    db_types::{FullRole, NewRole, Permission, PermissionRecord, RoleRecord},
    sqlite::db::is_unique_violation,
    traits::RoleApiError,
};

pub async fn insert_role(store_id: i64, role: &NewRole, conn: &mut SqliteConnection) -> Result<RoleRecord, RoleApiError> {
    let store = sqlx::query_scalar::<_, i64>("SELECT id FROM stores WHERE id = ?")
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?;
    if store.is_none() {
        return Err(RoleApiError::StoreNotFound(store_id));
    }
    let record = sqlx::query_as::<_, RoleRecord>("INSERT INTO roles (store_id, name) VALUES (?, ?) RETURNING *")
        .bind(store_id)
        .bind(&role.name)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RoleApiError::DuplicateRoleName(role.name.clone())
            } else {
                RoleApiError::from(e)
            }
        })?;
    Ok(record)
}

pub async fn full_role(
    store_id: i64,
    role_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<FullRole>, RoleApiError> {
    let Some(role) = sqlx::query_as::<_, RoleRecord>("SELECT * FROM roles WHERE id = ? AND store_id = ?")
        .bind(role_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let permissions = role_permissions(role_id, conn).await?;
    Ok(Some(FullRole { role, permissions }))
}

pub async fn fetch_roles(store_id: i64, conn: &mut SqliteConnection) -> Result<Vec<RoleRecord>, RoleApiError> {
    let roles = sqlx::query_as::<_, RoleRecord>("SELECT * FROM roles WHERE store_id = ? ORDER BY id")
        .bind(store_id)
        .fetch_all(conn)
        .await?;
    Ok(roles)
}

/// Replaces the role's grants with exactly the given set. Run inside a transaction; a
/// failed insert must restore the old grants.
pub async fn replace_role_permissions(
    store_id: i64,
    role_id: i64,
    permissions: &[Permission],
    conn: &mut SqliteConnection,
) -> Result<FullRole, RoleApiError> {
    let Some(role) = sqlx::query_as::<_, RoleRecord>("SELECT * FROM roles WHERE id = ? AND store_id = ?")
        .bind(role_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Err(RoleApiError::RoleNotFound);
    };
    sqlx::query("DELETE FROM role_permissions WHERE role_id = ?").bind(role_id).execute(&mut *conn).await?;
    for permission in permissions {
        sqlx::query("INSERT OR IGNORE INTO role_permissions (role_id, permission_id) SELECT ?, id FROM permissions WHERE function = ?")
            .bind(role_id)
            .bind(*permission)
            .execute(&mut *conn)
            .await?;
    }
    let permissions = role_permissions(role_id, conn).await?;
    Ok(FullRole { role, permissions })
}

pub async fn delete_role(store_id: i64, role_id: i64, conn: &mut SqliteConnection) -> Result<(), RoleApiError> {
    let res = sqlx::query("DELETE FROM roles WHERE id = ? AND store_id = ?")
        .bind(role_id)
        .bind(store_id)
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(RoleApiError::RoleNotFound);
    }
    Ok(())
}

pub async fn fetch_permission_catalogue(conn: &mut SqliteConnection) -> Result<Vec<PermissionRecord>, RoleApiError> {
    let permissions =
        sqlx::query_as::<_, PermissionRecord>("SELECT * FROM permissions ORDER BY id").fetch_all(conn).await?;
    Ok(permissions)
}

async fn role_permissions(role_id: i64, conn: &mut SqliteConnection) -> Result<Vec<PermissionRecord>, RoleApiError> {
    let permissions = sqlx::query_as::<_, PermissionRecord>(
        r#"SELECT permissions.* FROM permissions
           INNER JOIN role_permissions ON role_permissions.permission_id = permissions.id
           WHERE role_permissions.role_id = ?
           ORDER BY permissions.id"#,
    )
    .bind(role_id)
    .fetch_all(conn)
    .await?;
    Ok(permissions)
}
