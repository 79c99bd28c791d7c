use chrono::{Duration, Utc};
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderStatus, PaymentUpdate, SessionId},
    sqlite::db::is_unique_violation,
    traits::SettlementError,
};

/// Inserts a pending placeholder for a freshly opened session. Idempotent: an existing order for the session is
/// returned untouched, including when a concurrent insert beats us to the unique index.
pub(crate) async fn insert_pending(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SettlementError> {
    let session_id = order
        .session_id
        .clone()
        .ok_or_else(|| SettlementError::DatabaseError("A placeholder order requires a session id".to_string()))?;
    if let Some(existing) = fetch_by_session(&session_id, &mut *conn).await? {
        return Ok((existing, false));
    }
    match insert_order(order, &mut *conn).await {
        Ok(order) => {
            debug!("🗃️ Pending order inserted with id {} for session {session_id}", order.id);
            Ok((order, true))
        },
        // Lost the insert race; the winner's row is the placeholder.
        Err(e) if is_unique_violation(&e) => {
            let existing = fetch_by_session(&session_id, conn)
                .await?
                .ok_or(SettlementError::OrderNotFoundForSession(session_id))?;
            Ok((existing, false))
        },
        Err(e) => Err(e.into()),
    }
}

/// Inserts a fully settled order. A unique-index conflict is reported as a duplicate so the caller can switch to
/// the read-back path.
pub(crate) async fn insert_paid(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SettlementError> {
    let session_id = order.session_id.clone();
    match insert_order(order, conn).await {
        Ok(order) => {
            debug!("🗃️ Paid order inserted with id {}", order.id);
            Ok(order)
        },
        Err(e) if is_unique_violation(&e) => {
            if e.to_string().contains("payment_intent_id") {
                Err(SettlementError::DuplicatePaymentIntent("payment intent already settled".to_string()))
            } else {
                let id = session_id.unwrap_or_else(|| SessionId::from(""));
                Err(SettlementError::DuplicateSession(id))
            }
        },
        Err(e) => Err(e.into()),
    }
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let paid_at = order.is_paid.then(Utc::now);
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                session_id,
                payment_intent_id,
                customer_id,
                items,
                shipping_address,
                payment_method,
                items_price,
                tax_price,
                shipping_price,
                discount,
                total_price,
                email,
                is_paid,
                paid_at,
                status,
                payment_status,
                promo_code
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *;
        "#,
    )
    .bind(order.session_id)
    .bind(order.payment_intent_id)
    .bind(order.customer_id)
    .bind(Json(order.items))
    .bind(Json(order.shipping_address))
    .bind(order.payment_method)
    .bind(order.items_price)
    .bind(order.tax_price)
    .bind(order.shipping_price)
    .bind(order.discount)
    .bind(order.total_price)
    .bind(order.email)
    .bind(order.is_paid)
    .bind(paid_at)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.promo_code)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub(crate) async fn fetch_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub(crate) async fn fetch_by_session(
    session_id: &SessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE session_id = $1")
        .bind(session_id.as_str())
        .fetch_optional(conn)
        .await
}

/// The pending→paid transition, as a single guarded write. Only the call whose UPDATE matches the `is_paid = 0`
/// guard observes `true`; every concurrent or repeated call reads the settled row back instead.
pub(crate) async fn mark_paid(
    session_id: &SessionId,
    update: PaymentUpdate,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SettlementError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                is_paid = 1,
                paid_at = CURRENT_TIMESTAMP,
                status = 'Completed',
                payment_status = 'Paid',
                payment_intent_id = COALESCE(payment_intent_id, $2),
                customer_id = COALESCE(customer_id, $3),
                email = COALESCE(email, $4),
                updated_at = CURRENT_TIMESTAMP
            WHERE session_id = $1 AND is_paid = 0
            RETURNING *;
        "#,
    )
    .bind(session_id.as_str())
    .bind(update.payment_intent_id)
    .bind(update.customer_id)
    .bind(update.email)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(order) => {
            debug!("🗃️ Order #{} transitioned to paid for session {session_id}", order.id);
            Ok((order, true))
        },
        None => {
            let order = fetch_by_session(session_id, conn)
                .await?
                .ok_or_else(|| SettlementError::OrderNotFoundForSession(session_id.clone()))?;
            Ok((order, false))
        },
    }
}

pub(crate) async fn update_status(
    id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, SettlementError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(SettlementError::OrderNotFound(id))
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`, oldest first.
pub(crate) async fn search(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(email) = query.email {
        where_clause.push("email = ");
        where_clause.push_bind_unseparated(email);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ search returned {} orders", orders.len());
    Ok(orders)
}

/// Cancels placeholder orders that have sat unpaid for longer than `older_than`.
pub(crate) async fn cancel_stale_pending(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SettlementError> {
    let rows = sqlx::query_as(
        format!(
            "UPDATE orders SET status = 'Cancelled', payment_status = 'Failed', updated_at = CURRENT_TIMESTAMP \
             WHERE is_paid = 0 AND status = 'Pending' AND session_id IS NOT NULL AND \
             (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) > {} RETURNING *;",
            older_than.num_seconds()
        )
        .as_str(),
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
