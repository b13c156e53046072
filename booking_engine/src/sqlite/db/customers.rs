//! Sqlite database operations for customers and their profiles.

use std::collections::HashMap;

use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Customer, CustomerProfile, CustomerUpdate, FullCustomer, NewCustomer},
    traits::CustomerApiError,
};

/// Inserts a customer row and its profile. Run inside a transaction; the two inserts must
/// land together.
pub async fn insert_customer(
    store_id: i64,
    customer: &NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<FullCustomer, CustomerApiError> {
    let row = sqlx::query_as::<_, Customer>("INSERT INTO customers (store_id) VALUES (?) RETURNING *")
        .bind(store_id)
        .fetch_one(&mut *conn)
        .await?;
    let profile = sqlx::query_as::<_, CustomerProfile>(
        r#"INSERT INTO customer_profiles
               (customer_id, name, name_ruby, mail_address, sex, phone_number, postal_code, prefecture, street,
                address, building)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"#,
    )
    .bind(row.id)
    .bind(&customer.name)
    .bind(&customer.name_ruby)
    .bind(&customer.mail_address)
    .bind(customer.sex)
    .bind(&customer.phone_number)
    .bind(&customer.postal_code)
    .bind(&customer.prefecture)
    .bind(&customer.street)
    .bind(&customer.address)
    .bind(&customer.building)
    .fetch_one(conn)
    .await?;
    Ok(FullCustomer { customer: row, profile: Some(profile) })
}

pub async fn full_customer_in_store(
    store_id: i64,
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<FullCustomer>, CustomerApiError> {
    let Some(customer) = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ? AND store_id = ?")
        .bind(customer_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let profile = fetch_profile(customer_id, conn).await?;
    Ok(Some(FullCustomer { customer, profile }))
}

pub async fn customers_for_store(
    store_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<FullCustomer>, CustomerApiError> {
    let rows = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE store_id = ? ORDER BY id")
        .bind(store_id)
        .fetch_all(&mut *conn)
        .await?;
    let profiles = sqlx::query_as::<_, CustomerProfile>(
        r#"SELECT customer_profiles.* FROM customer_profiles
           INNER JOIN customers ON customers.id = customer_profiles.customer_id
           WHERE customers.store_id = ?"#,
    )
    .bind(store_id)
    .fetch_all(conn)
    .await?;
    let mut by_customer = profiles.into_iter().map(|p| (p.customer_id, p)).collect::<HashMap<i64, CustomerProfile>>();
    let result = rows
        .into_iter()
        .map(|customer| {
            let profile = by_customer.remove(&customer.id);
            FullCustomer { customer, profile }
        })
        .collect();
    Ok(result)
}

/// Applies the non-`None` fields of the update to a customer of the given store.
pub async fn update_customer(
    store_id: i64,
    customer_id: i64,
    update: &CustomerUpdate,
    conn: &mut SqliteConnection,
) -> Result<FullCustomer, CustomerApiError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM customers WHERE id = ? AND store_id = ?")
        .bind(customer_id)
        .bind(store_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_none() {
        return Err(CustomerApiError::CustomerNotFound(customer_id));
    }
    let mut builder = QueryBuilder::new("UPDATE customer_profiles SET updated_at = CURRENT_TIMESTAMP, ");
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
    if let Some(sex) = update.sex {
        set_clause.push("sex = ");
        set_clause.push_bind_unseparated(sex);
    }
    if let Some(phone_number) = &update.phone_number {
        set_clause.push("phone_number = ");
        set_clause.push_bind_unseparated(phone_number);
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
    builder.push(" WHERE customer_id = ");
    builder.push_bind(customer_id);
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build().execute(&mut *conn).await?;
    full_customer_in_store(store_id, customer_id, conn)
        .await?
        .ok_or(CustomerApiError::CustomerNotFound(customer_id))
}

pub async fn delete_customer(
    store_id: i64,
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), CustomerApiError> {
    let res = sqlx::query("DELETE FROM customers WHERE id = ? AND store_id = ?")
        .bind(customer_id)
        .bind(store_id)
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(CustomerApiError::CustomerNotFound(customer_id));
    }
    Ok(())
}

async fn fetch_profile(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerProfile>, CustomerApiError> {
    let profile = sqlx::query_as::<_, CustomerProfile>("SELECT * FROM customer_profiles WHERE customer_id = ?")
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
    Ok(profile)
}
