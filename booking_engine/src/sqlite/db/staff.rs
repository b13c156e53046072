//! Sqlite database operations for staff records and their profiles.
//!
//! A staff member is two rows: the `staffs` principal and its `staff_profiles` row with the
//! person-facing fields. Provisioned federated accounts can temporarily lack the profile
//! row, which is why [`FullStaff`] carries it as an `Option`.

use std::collections::HashMap;

use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{FullStaff, NewStaff, Staff, StaffProfile, StaffUpdate},
    sqlite::db::is_unique_violation,
    traits::StaffApiError,
};

const PROFILE_COLUMNS: &str = "id, staff_id, name, name_ruby, mail_address, created_at, updated_at";

/// Inserts a staff row and its profile. Run inside a transaction; the two inserts must land
/// together.
pub async fn insert_staff(
    store_id: i64,
    staff: &NewStaff,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<FullStaff, StaffApiError> {
    let role = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE id = ? AND store_id = ?")
        .bind(staff.role_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?;
    if role.is_none() {
        return Err(StaffApiError::RoleNotFound);
    }
    let row = sqlx::query_as::<_, Staff>("INSERT INTO staffs (store_id, role_id) VALUES (?, ?) RETURNING *")
        .bind(store_id)
        .bind(staff.role_id)
        .fetch_one(&mut *conn)
        .await?;
    let profile = sqlx::query_as::<_, StaffProfile>(&format!(
        r#"INSERT INTO staff_profiles (staff_id, name, name_ruby, mail_address, password_hash)
           VALUES (?, ?, ?, ?, ?) RETURNING {PROFILE_COLUMNS}"#
    ))
    .bind(row.id)
    .bind(&staff.name)
    .bind(&staff.name_ruby)
    .bind(&staff.mail_address)
    .bind(password_hash)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { StaffApiError::DuplicateEmail } else { e.into() })?;
    Ok(FullStaff { staff: row, profile: Some(profile) })
}

pub async fn full_staff_by_id(staff_id: i64, conn: &mut SqliteConnection) -> Result<Option<FullStaff>, StaffApiError> {
    let Some(staff) = sqlx::query_as::<_, Staff>("SELECT * FROM staffs WHERE id = ?")
        .bind(staff_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let profile = fetch_profile(staff_id, conn).await?;
    Ok(Some(FullStaff { staff, profile }))
}

pub async fn full_staff_in_store(
    store_id: i64,
    staff_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<FullStaff>, StaffApiError> {
    let Some(staff) = sqlx::query_as::<_, Staff>("SELECT * FROM staffs WHERE id = ? AND store_id = ?")
        .bind(staff_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let profile = fetch_profile(staff_id, conn).await?;
    Ok(Some(FullStaff { staff, profile }))
}

pub async fn staff_for_store(store_id: i64, conn: &mut SqliteConnection) -> Result<Vec<FullStaff>, StaffApiError> {
    let rows = sqlx::query_as::<_, Staff>("SELECT * FROM staffs WHERE store_id = ? ORDER BY id")
        .bind(store_id)
        .fetch_all(&mut *conn)
        .await?;
    let profiles = sqlx::query_as::<_, StaffProfile>(
        r#"SELECT staff_profiles.id, staff_id, staff_profiles.name, staff_profiles.name_ruby, mail_address,
                  staff_profiles.created_at, staff_profiles.updated_at
           FROM staff_profiles INNER JOIN staffs ON staffs.id = staff_profiles.staff_id
           WHERE staffs.store_id = ?"#,
    )
    .bind(store_id)
    .fetch_all(conn)
    .await?;
    let mut by_staff = profiles.into_iter().map(|p| (p.staff_id, p)).collect::<HashMap<i64, StaffProfile>>();
    let result = rows
        .into_iter()
        .map(|staff| {
            let profile = by_staff.remove(&staff.id);
            FullStaff { staff, profile }
        })
        .collect();
    Ok(result)
}

/// Applies the non-`None` fields of the update to a staff member of the given store. A role
/// change is validated against the same store's roles.
pub async fn update_staff(
    store_id: i64,
    staff_id: i64,
    update: &StaffUpdate,
    conn: &mut SqliteConnection,
) -> Result<FullStaff, StaffApiError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM staffs WHERE id = ? AND store_id = ?")
        .bind(staff_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_none() {
        return Err(StaffApiError::StaffNotFound(staff_id));
    }
    if let Some(role_id) = update.role_id {
        let role = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE id = ? AND store_id = ?")
            .bind(role_id)
            .bind(store_id)
            .fetch_optional(&mut *conn)
            .await?;
        if role.is_none() {
            return Err(StaffApiError::RoleNotFound);
        }
        sqlx::query("UPDATE staffs SET role_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(role_id)
            .bind(staff_id)
            .execute(&mut *conn)
            .await?;
    }
    if update.has_profile_fields() {
        update_profile_fields(staff_id, update, &mut *conn).await?;
    }
    full_staff_by_id(staff_id, conn).await?.ok_or(StaffApiError::StaffNotFound(staff_id))
}

/// Applies profile fields by staff id alone. Role changes never travel through this path,
/// so staff cannot escalate themselves while editing their own profile.
pub async fn update_staff_unscoped(
    staff_id: i64,
    update: &StaffUpdate,
    conn: &mut SqliteConnection,
) -> Result<FullStaff, StaffApiError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM staffs WHERE id = ?")
        .bind(staff_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_none() {
        return Err(StaffApiError::StaffNotFound(staff_id));
    }
    if update.has_profile_fields() {
        update_profile_fields(staff_id, update, &mut *conn).await?;
    }
    full_staff_by_id(staff_id, conn).await?.ok_or(StaffApiError::StaffNotFound(staff_id))
}

pub async fn delete_staff(store_id: i64, staff_id: i64, conn: &mut SqliteConnection) -> Result<(), StaffApiError> {
    let res = sqlx::query("DELETE FROM staffs WHERE id = ? AND store_id = ?")
        .bind(staff_id)
        .bind(store_id)
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(StaffApiError::StaffNotFound(staff_id));
    }
    Ok(())
}

async fn fetch_profile(staff_id: i64, conn: &mut SqliteConnection) -> Result<Option<StaffProfile>, StaffApiError> {
    let profile =
        sqlx::query_as::<_, StaffProfile>(&format!("SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE staff_id = ?"))
            .bind(staff_id)
            .fetch_optional(conn)
            .await?;
    Ok(profile)
}

async fn update_profile_fields(
    staff_id: i64,
    update: &StaffUpdate,
    conn: &mut SqliteConnection,
) -> Result<(), StaffApiError> {
    let mut builder = QueryBuilder::new("UPDATE staff_profiles SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = &update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(name_ruby) = &update.name_ruby {
        set_clause.push("name_ruby = ");
        set_clause.push_bind_unseparated(name_ruby);
    }
    if let Some(mail) = &update.mail_address {
        set_clause.push("mail_address = ");
        set_clause.push_bind_unseparated(mail);
    }
    builder.push(" WHERE staff_id = ");
    builder.push_bind(staff_id);
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| if is_unique_violation(&e) { StaffApiError::DuplicateEmail } else { StaffApiError::from(e) })?;
    if res.rows_affected() == 0 {
        // Provisioned federated staff may not have a profile row yet. Create one if the
        // update carries enough to satisfy the schema.
        let (Some(name), Some(mail)) = (&update.name, &update.mail_address) else {
            return Err(StaffApiError::ProfileMissing);
        };
        let name_ruby = update.name_ruby.clone().unwrap_or_default();
        sqlx::query("INSERT INTO staff_profiles (staff_id, name, name_ruby, mail_address) VALUES (?, ?, ?, ?)")
            .bind(staff_id)
            .bind(name)
            .bind(name_ruby)
            .bind(mail)
            .execute(conn)
            .await
            .map_err(|e| if is_unique_violation(&e) { StaffApiError::DuplicateEmail } else { StaffApiError::from(e) })?;
    }
    Ok(())
}
