use thiserror::Error;

use crate::db_types::{
    DeliveryStatus,
    GeoPoint,
    NewTracking,
    RestaurantOrigin,
    RiderDescriptor,
    Tracking,
    TrackingEntry,
};

/// The delivery-tracking contract a storage backend must satisfy.
///
/// One tracking record exists per order (unique order reference, store-arbitrated). History is append-only: every
/// status transition writes exactly one entry, atomically with the status update itself.
#[allow(async_fn_in_trait)]
pub trait TrackingDatabase: Clone {
    /// Creates the tracking record for an order, seeding history with a single `Placed` entry at the restaurant
    /// origin. Fails with [`TrackingError::TrackingAlreadyExists`] if the order already has one.
    async fn create_tracking(&self, tracking: NewTracking, origin: &RestaurantOrigin)
        -> Result<Tracking, TrackingError>;

    async fn fetch_tracking_for_order(&self, order_id: i64) -> Result<Option<Tracking>, TrackingError>;

    /// Applies a status transition: sets the status, overwrites the current location when one is given, appends one
    /// history entry, and stamps the actual delivery time on the first transition into `Delivered`. Transitions out
    /// of a terminal state are rejected with [`TrackingError::TerminalState`] without touching history.
    async fn update_tracking_status(
        &self,
        order_id: i64,
        status: DeliveryStatus,
        location: Option<GeoPoint>,
        message: Option<String>,
    ) -> Result<Tracking, TrackingError>;

    /// Sets the rider reference and the denormalized rider-info snapshot. Does not touch status or history.
    async fn assign_rider(&self, order_id: i64, rider: RiderDescriptor) -> Result<Tracking, TrackingError>;

    /// Overwrites the current location. Fails with [`TrackingError::NoRiderAssigned`] when no rider is assigned;
    /// only riders move. Does not append history.
    async fn update_rider_location(&self, order_id: i64, location: GeoPoint) -> Result<Tracking, TrackingError>;

    /// The append-only history for the order, oldest first (insertion id breaks timestamp ties).
    async fn fetch_history_for_order(&self, order_id: i64) -> Result<Vec<TrackingEntry>, TrackingError>;

    /// Active, non-terminal trackings for a customer, newest first.
    async fn fetch_active_trackings_for_customer(&self, customer_id: i64) -> Result<Vec<Tracking>, TrackingError>;

    /// Trackings eligible for pickup (`ReadyForPickup` or `OutForDelivery`, active) within `max_distance_m` meters
    /// of `point`, paired with their great-circle distance and sorted nearest first. An empty result is not an
    /// error.
    async fn fetch_trackings_near(
        &self,
        point: GeoPoint,
        max_distance_m: f64,
    ) -> Result<Vec<(Tracking, f64)>, TrackingError>;
}

#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Tracking already exists for order {0}")]
    TrackingAlreadyExists(i64),
    #[error("No tracking exists for order {0}")]
    TrackingNotFound(i64),
    #[error("Tracking for order {order_id} is already {status} and cannot change status")]
    TerminalState { order_id: i64, status: DeliveryStatus },
    #[error("No rider is assigned to the tracking for order {0}")]
    NoRiderAssigned(i64),
}

impl From<sqlx::Error> for TrackingError {
    fn from(e: sqlx::Error) -> Self {
        TrackingError::DatabaseError(e.to_string())
    }
}
