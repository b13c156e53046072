//! Sqlite database operations for bookings.
//!
//! `duration_by_minutes` is never accepted from callers. It is computed here from the
//! booking window on insert, and recomputed whenever an update moves either end of the
//! window.

use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{Event, EventRecord, EventUpdate, FullStaff, NewEvent},
    sqlite::db::staff,
    traits::EventApiError,
};

/// Inserts a booking and its staff assignments. Run inside a transaction; a missing staff
/// member must roll back the event row as well.
pub async fn insert_event(store_id: i64, event: &NewEvent, conn: &mut SqliteConnection) -> Result<EventRecord, EventApiError> {
    let customer = sqlx::query_scalar::<_, i64>("SELECT id FROM customers WHERE id = ? AND store_id = ?")
        .bind(event.customer_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?;
    if customer.is_none() {
        return Err(EventApiError::CustomerNotFound(event.customer_id));
    }
    let duration = (event.to_at - event.from_at).num_minutes();
    let details = event.details.as_ref().map(|d| Json(d.clone()));
    let row = sqlx::query_as::<_, Event>(
        r#"INSERT INTO events (store_id, customer_id, title, from_at, to_at, duration_by_minutes, note, details, status)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"#,
    )
    .bind(store_id)
    .bind(event.customer_id)
    .bind(&event.title)
    .bind(event.from_at)
    .bind(event.to_at)
    .bind(duration)
    .bind(&event.note)
    .bind(details)
    .bind(event.status)
    .fetch_one(&mut *conn)
    .await?;
    for staff_id in &event.staff_ids {
        let staff = sqlx::query_scalar::<_, i64>("SELECT id FROM staffs WHERE id = ? AND store_id = ?")
            .bind(staff_id)
            .bind(store_id)
            .fetch_optional(&mut *conn)
            .await?;
        if staff.is_none() {
            return Err(EventApiError::StaffNotFound(*staff_id));
        }
        sqlx::query("INSERT OR IGNORE INTO event_staff (event_id, staff_id) VALUES (?, ?)")
            .bind(row.id)
            .bind(staff_id)
            .execute(&mut *conn)
            .await?;
    }
    let staff = assigned_staff(row.id, conn).await?;
    Ok(EventRecord { event: row, staff })
}

pub async fn fetch_event(
    store_id: i64,
    event_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EventRecord>, EventApiError> {
    let Some(event) = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ? AND store_id = ?")
        .bind(event_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let staff = assigned_staff(event.id, conn).await?;
    Ok(Some(EventRecord { event, staff }))
}

pub async fn fetch_events(store_id: i64, conn: &mut SqliteConnection) -> Result<Vec<EventRecord>, EventApiError> {
    let rows = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE store_id = ? ORDER BY from_at, id")
        .bind(store_id)
        .fetch_all(&mut *conn)
        .await?;
    let mut result = Vec::with_capacity(rows.len());
    for event in rows {
        let staff = assigned_staff(event.id, &mut *conn).await?;
        result.push(EventRecord { event, staff });
    }
    Ok(result)
}

/// Applies the non-`None` fields of the update. The window is validated and the duration
/// recomputed against the merged `from_at`/`to_at`, so moving a single bound keeps the
/// invariant intact.
pub async fn update_event(
    store_id: i64,
    event_id: i64,
    update: &EventUpdate,
    conn: &mut SqliteConnection,
) -> Result<EventRecord, EventApiError> {
    let Some(current) = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ? AND store_id = ?")
        .bind(event_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Err(EventApiError::EventNotFound(event_id));
    };
    let from_at = update.from_at.unwrap_or(current.from_at);
    let to_at = update.to_at.unwrap_or(current.to_at);
    if to_at < from_at {
        return Err(EventApiError::InvalidTimeWindow(format!(
            "the booking ends ({to_at}) before it starts ({from_at})"
        )));
    }
    let duration = (to_at - from_at).num_minutes();
    let title = update.title.clone().unwrap_or(current.title);
    let note = update.note.clone().or(current.note);
    let status = update.status.unwrap_or(current.status);
    trace!("🗃️ Updating event #{event_id}: window {from_at}..{to_at} ({duration} min)");
    let event = sqlx::query_as::<_, Event>(
        r#"UPDATE events
           SET title = ?, from_at = ?, to_at = ?, duration_by_minutes = ?, note = ?, status = ?,
               updated_at = CURRENT_TIMESTAMP
           WHERE id = ? RETURNING *"#,
    )
    .bind(title)
    .bind(from_at)
    .bind(to_at)
    .bind(duration)
    .bind(note)
    .bind(status)
    .bind(event_id)
    .fetch_one(&mut *conn)
    .await?;
    let staff = assigned_staff(event.id, conn).await?;
    Ok(EventRecord { event, staff })
}

pub async fn delete_event(store_id: i64, event_id: i64, conn: &mut SqliteConnection) -> Result<(), EventApiError> {
    let res = sqlx::query("DELETE FROM events WHERE id = ? AND store_id = ?")
        .bind(event_id)
        .bind(store_id)
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(EventApiError::EventNotFound(event_id));
    }
    Ok(())
}

async fn assigned_staff(event_id: i64, conn: &mut SqliteConnection) -> Result<Vec<FullStaff>, EventApiError> {
    let staff_ids = sqlx::query_scalar::<_, i64>("SELECT staff_id FROM event_staff WHERE event_id = ? ORDER BY staff_id")
        .bind(event_id)
        .fetch_all(&mut *conn)
        .await?;
    let mut result = Vec::with_capacity(staff_ids.len());
    for staff_id in staff_ids {
        if let Some(full) = staff::full_staff_by_id(staff_id, &mut *conn).await? {
            result.push(full);
        }
    }
    Ok(result)
}
