//! Sqlite database operations for the store directory.

use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewStore, Store, StoreUpdate},
    traits::StoreApiError,
};

pub async fn insert_store(store: &NewStore, conn: &mut SqliteConnection) -> Result<Store, StoreApiError> {
    let store = sqlx::query_as::<_, Store>(
        r#"INSERT INTO stores (name, name_ruby, postal_code, prefecture, street, address, building, phone_number)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"#,
    )
    .bind(&store.name)
    .bind(&store.name_ruby)
    .bind(&store.postal_code)
    .bind(&store.prefecture)
    .bind(&store.street)
    .bind(&store.address)
    .bind(&store.building)
    .bind(&store.phone_number)
    .fetch_one(conn)
    .await?;
    Ok(store)
}

pub async fn fetch_store(store_id: i64, conn: &mut SqliteConnection) -> Result<Option<Store>, StoreApiError> {
    let store = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = ?")
        .bind(store_id)
        .fetch_optional(conn)
        .await?;
    Ok(store)
}

pub async fn fetch_stores(conn: &mut SqliteConnection) -> Result<Vec<Store>, StoreApiError> {
    let stores = sqlx::query_as::<_, Store>("SELECT * FROM stores ORDER BY id").fetch_all(conn).await?;
    Ok(stores)
}

/// Applies the non-`None` fields of the update. The caller has already rejected empty
/// updates.
pub async fn update_store(
    store_id: i64,
    update: &StoreUpdate,
    conn: &mut SqliteConnection,
) -> Result<Store, StoreApiError> {
    let mut builder = QueryBuilder::new("UPDATE stores SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = &update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(name_ruby) = &update.name_ruby {
        set_clause.push("name_ruby = ");
        set_clause.push_bind_unseparated(name_ruby);
    }
    if let Some(postal_code) = &update.postal_code {
        set_clause.push("postal_code = ");
        set_clause.push_bind_unseparated(postal_code);
    }
    if let Some(prefecture) = &update.prefecture {
        set_clause.push("prefecture = ");
        set_clause.push_bind_unseparated(prefecture);
    }
    if let Some(street) = &update.street {
        set_clause.push("street = ");
        set_clause.push_bind_unseparated(street);
    }
    if let Some(address) = &update.address {
        set_clause.push("address = ");
        set_clause.push_bind_unseparated(address);
    }
    if let Some(building) = &update.building {
        set_clause.push("building = ");
        set_clause.push_bind_unseparated(building);
    }
    if let Some(phone_number) = &update.phone_number {
        set_clause.push("phone_number = ");
        set_clause.push_bind_unseparated(phone_number);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(store_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let store = builder.build_query_as::<Store>().fetch_optional(conn).await?;
    store.ok_or(StoreApiError::StoreNotFound(store_id))
}
