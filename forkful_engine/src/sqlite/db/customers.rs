use log::trace;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{Cart, Customer, Order, OrderItem},
    traits::CustomerApiError,
};

pub(crate) async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub(crate) async fn fetch_customer_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub(crate) async fn insert_customer(
    username: &str,
    email: &str,
    phone: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as("INSERT INTO customers (username, email, phone) VALUES ($1, $2, $3) RETURNING *")
        .bind(username)
        .bind(email)
        .bind(phone)
        .fetch_one(conn)
        .await
}

pub(crate) async fn fetch_orders_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC")
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

pub(crate) async fn fetch_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM carts WHERE customer_id = $1").bind(customer_id).fetch_optional(conn).await
}

pub(crate) async fn upsert_cart(
    customer_id: i64,
    items: Vec<OrderItem>,
    conn: &mut SqliteConnection,
) -> Result<Cart, CustomerApiError> {
    let cart = sqlx::query_as(
        r#"
            INSERT INTO carts (customer_id, items, updated_at) VALUES ($1, $2, CURRENT_TIMESTAMP)
            ON CONFLICT (customer_id) DO UPDATE SET items = excluded.items, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(Json(items))
    .fetch_one(conn)
    .await?;
    Ok(cart)
}

/// Empties the cart document. Returns whether a cart existed at all. There is deliberately no coordination with
/// concurrent cart edits; see the `CustomerManagement` trait docs.
pub(crate) async fn clear_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<bool, CustomerApiError> {
    let result = sqlx::query("UPDATE carts SET items = '[]', updated_at = CURRENT_TIMESTAMP WHERE customer_id = $1")
        .bind(customer_id)
        .execute(conn)
        .await?;
    trace!("🗃️ clear_cart for customer #{customer_id} touched {} rows", result.rows_affected());
    Ok(result.rows_affected() > 0)
}
