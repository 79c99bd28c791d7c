use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{DeliveryStatus, GeoPoint, NewTracking, RestaurantOrigin, RiderDescriptor, Tracking, TrackingEntry},
    helpers::geo::haversine_m,
    sqlite::db::is_unique_violation,
    traits::TrackingError,
};

/// Creates the tracking row and its initial `Placed` history entry. Run inside a transaction so the record never
/// exists without its first history entry.
pub(crate) async fn create(
    tracking: NewTracking,
    origin: &RestaurantOrigin,
    conn: &mut SqliteConnection,
) -> Result<Tracking, TrackingError> {
    let order_id = tracking.order_id;
    let row: Tracking = sqlx::query_as(
        r#"
            INSERT INTO tracking (
                order_id, customer_id, status,
                current_lng, current_lat,
                dest_lng, dest_lat, dest_address,
                origin_lng, origin_lat, origin_address,
                eta
            ) VALUES ($1, $2, 'Placed', $3, $4, $5, $6, $7, $3, $4, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(tracking.customer_id)
    .bind(origin.location.lng)
    .bind(origin.location.lat)
    .bind(tracking.destination.lng)
    .bind(tracking.destination.lat)
    .bind(tracking.destination_address)
    .bind(origin.address.as_str())
    .bind(tracking.eta)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            TrackingError::TrackingAlreadyExists(order_id)
        } else {
            TrackingError::from(e)
        }
    })?;
    append_history(
        row.id,
        DeliveryStatus::Placed,
        origin.location,
        "Order has been placed successfully",
        &mut *conn,
    )
    .await?;
    debug!("🗃️ Tracking #{} created for order #{order_id}", row.id);
    Ok(row)
}

pub(crate) async fn fetch_by_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Tracking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tracking WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// Applies a status transition. The terminal-state guard is folded into the UPDATE's WHERE clause so check and
/// write are a single atomic statement; concurrent transitions queue behind the store's write lock and each appends
/// its own history entry. Run inside a transaction so the status update and its history entry land together.
pub(crate) async fn update_status(
    order_id: i64,
    status: DeliveryStatus,
    location: Option<GeoPoint>,
    message: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Tracking, TrackingError> {
    let updated: Option<Tracking> = sqlx::query_as(
        r#"
            UPDATE tracking SET
                status = $2,
                current_lng = COALESCE($3, current_lng),
                current_lat = COALESCE($4, current_lat),
                delivered_at = CASE
                    WHEN $2 = 'Delivered' THEN COALESCE(delivered_at, CURRENT_TIMESTAMP)
                    ELSE delivered_at
                END,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status NOT IN ('Delivered', 'Cancelled')
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(location.map(|l| l.lng))
    .bind(location.map(|l| l.lat))
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(tracking) => {
            let loc = location.unwrap_or(tracking.current_location);
            append_history(tracking.id, status, loc, message.as_deref().unwrap_or(""), conn).await?;
            Ok(tracking)
        },
        None => match fetch_by_order(order_id, conn).await? {
            Some(tracking) => Err(TrackingError::TerminalState { order_id, status: tracking.status }),
            None => Err(TrackingError::TrackingNotFound(order_id)),
        },
    }
}

pub(crate) async fn assign_rider(
    order_id: i64,
    rider: RiderDescriptor,
    conn: &mut SqliteConnection,
) -> Result<Tracking, TrackingError> {
    let info = rider.info();
    let updated: Option<Tracking> = sqlx::query_as(
        r#"
            UPDATE tracking SET
                rider_id = $2,
                rider_name = $3,
                rider_phone = $4,
                rider_vehicle_type = $5,
                rider_vehicle_number = $6,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(rider.rider_id)
    .bind(info.name)
    .bind(info.phone)
    .bind(info.vehicle_type)
    .bind(info.vehicle_number)
    .fetch_optional(conn)
    .await?;
    updated.ok_or(TrackingError::TrackingNotFound(order_id))
}

/// Overwrites the current location. Guarded on a rider being assigned — the WHERE clause makes the check atomic
/// with the write; a miss is classified afterwards.
pub(crate) async fn update_location(
    order_id: i64,
    location: GeoPoint,
    conn: &mut SqliteConnection,
) -> Result<Tracking, TrackingError> {
    let updated: Option<Tracking> = sqlx::query_as(
        r#"
            UPDATE tracking SET current_lng = $2, current_lat = $3, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND rider_id IS NOT NULL
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(location.lng)
    .bind(location.lat)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(tracking) => Ok(tracking),
        None => match fetch_by_order(order_id, conn).await? {
            Some(_) => Err(TrackingError::NoRiderAssigned(order_id)),
            None => Err(TrackingError::TrackingNotFound(order_id)),
        },
    }
}

pub(crate) async fn history_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TrackingEntry>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT h.* FROM tracking_history h
            JOIN tracking t ON t.id = h.tracking_id
            WHERE t.order_id = $1
            ORDER BY h.created_at ASC, h.id ASC;
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub(crate) async fn active_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Tracking>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM tracking
            WHERE customer_id = $1 AND is_active = 1 AND status NOT IN ('Delivered', 'Cancelled')
            ORDER BY created_at DESC;
        "#,
    )
    .bind(customer_id)
    .fetch_all(conn)
    .await
}

/// Pickup candidates near a point. The status/activity filter runs in SQL; the spherical distance is computed here
/// since SQLite carries no geospatial index. Results are (tracking, distance in meters), nearest first.
pub(crate) async fn near(
    point: GeoPoint,
    max_distance_m: f64,
    conn: &mut SqliteConnection,
) -> Result<Vec<(Tracking, f64)>, sqlx::Error> {
    let candidates: Vec<Tracking> = sqlx::query_as(
        "SELECT * FROM tracking WHERE is_active = 1 AND status IN ('ReadyForPickup', 'OutForDelivery')",
    )
    .fetch_all(conn)
    .await?;
    let mut matches = candidates
        .into_iter()
        .map(|t| {
            let d = haversine_m(&point, &t.current_location);
            (t, d)
        })
        .filter(|(_, d)| *d <= max_distance_m)
        .collect::<Vec<_>>();
    matches.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    trace!("🗃️ {} pickup candidates within {max_distance_m}m", matches.len());
    Ok(matches)
}

async fn append_history(
    tracking_id: i64,
    status: DeliveryStatus,
    location: GeoPoint,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tracking_history (tracking_id, status, lng, lat, message) VALUES ($1, $2, $3, $4, $5)")
        .bind(tracking_id)
        .bind(status)
        .bind(location.lng)
        .bind(location.lat)
        .bind(message)
        .execute(conn)
        .await?;
    Ok(())
}
