//! Sqlite database operations for staff authentication and identity.
//!
//! Generally clients should never call these methods directly, and prefer to use the
//! [`AuthManagement`](crate::traits::AuthManagement) trait methods that are implemented on the
//! [`SqliteDatabase`](crate::SqliteDatabase) struct instead.

use bms_common::EmailAddress;
use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{
    db_types::{FederatedStaff, Permission, Staff, StaffAccess, StaffCredential},
    sqlite::db::is_unique_violation,
    traits::AuthApiError,
};

pub async fn staff_by_email(email: &EmailAddress, conn: &mut SqliteConnection) -> Result<Option<Staff>, AuthApiError> {
    let staff = sqlx::query_as::<_, Staff>(
        r#"SELECT staffs.* FROM staffs
           INNER JOIN staff_profiles ON staff_profiles.staff_id = staffs.id
           WHERE staff_profiles.mail_address = ?"#,
    )
    .bind(email.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(staff)
}

/// Fetches the local login credential for an email address. Profiles without a password
/// digest (federated accounts) are filtered out here, so callers can treat `None` uniformly
/// as "no local login".
pub async fn credential_by_email(
    email: &EmailAddress,
    conn: &mut SqliteConnection,
) -> Result<Option<StaffCredential>, AuthApiError> {
    let credential = sqlx::query_as::<_, StaffCredential>(
        r#"SELECT staff_id, mail_address, password_hash FROM staff_profiles
           WHERE mail_address = ? AND password_hash IS NOT NULL"#,
    )
    .bind(email.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(credential)
}

pub async fn staff_by_external_id(
    external_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Staff>, AuthApiError> {
    let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staffs WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(conn)
        .await?;
    Ok(staff)
}

/// Inserts an unassigned staff row for a federated subject, plus a profile row when the
/// identity carries an email address. Run inside a transaction; the two inserts must land
/// together.
pub async fn insert_federated_staff(
    staff: &FederatedStaff,
    conn: &mut SqliteConnection,
) -> Result<Staff, AuthApiError> {
    let row = sqlx::query_as::<_, Staff>("INSERT INTO staffs (store_id, role_id, external_id) VALUES (NULL, NULL, ?) RETURNING *")
        .bind(&staff.external_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| if is_unique_violation(&e) { AuthApiError::DuplicateIdentity } else { e.into() })?;
    debug!("🗃️ Provisioned staff #{} for federated subject [{}]", row.id, staff.external_id);
    if let Some(mail) = &staff.mail_address {
        let name = staff.name.clone().unwrap_or_default();
        let res = sqlx::query("INSERT INTO staff_profiles (staff_id, name, mail_address) VALUES (?, ?, ?)")
            .bind(row.id)
            .bind(name)
            .bind(mail.as_str())
            .execute(conn)
            .await;
        match res {
            Ok(_) => {},
            Err(e) if is_unique_violation(&e) => {
                warn!("🗃️ A profile already holds {mail}. Staff #{} was provisioned without one", row.id);
            },
            Err(e) => return Err(e.into()),
        }
    }
    Ok(row)
}

pub async fn update_password_hash(
    email: &EmailAddress,
    hash: &str,
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    let res = sqlx::query("UPDATE staff_profiles SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE mail_address = ?")
        .bind(hash)
        .bind(email.as_str())
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AuthApiError::EmailNotFound);
    }
    Ok(())
}

/// The role name(s) and granted permissions for a staff id. Staff without a role produce
/// empty vectors.
pub async fn access_for_staff(staff_id: i64, conn: &mut SqliteConnection) -> Result<StaffAccess, AuthApiError> {
    let roles = sqlx::query_scalar::<_, String>(
        r#"SELECT roles.name FROM staffs
           INNER JOIN roles ON roles.id = staffs.role_id
           WHERE staffs.id = ?"#,
    )
    .bind(staff_id)
    .fetch_all(&mut *conn)
    .await?;
    let permissions = sqlx::query_scalar::<_, Permission>(
        r#"SELECT permissions.function FROM staffs
           INNER JOIN role_permissions ON role_permissions.role_id = staffs.role_id
           INNER JOIN permissions ON permissions.id = role_permissions.permission_id
           WHERE staffs.id = ?"#,
    )
    .bind(staff_id)
    .fetch_all(conn)
    .await?;
    debug!("🗃️ Staff #{staff_id} holds roles {roles:?} granting {permissions:?}");
    Ok(StaffAccess { roles, permissions })
}
