use std::fmt::Display;

use chrono::{DateTime, Utc};
use forkful_engine::{
    api::tracking_objects::TrackingSnapshot,
    db_types::{DeliveryStatus, GeoPoint, Order, OrderStatus, RiderDescriptor, TrackingEntry},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------      Checkout       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetailsResponse {
    pub success: bool,
    pub session_id: String,
    /// `paid` or `unpaid`, as the gateway reports it.
    pub payment_status: String,
    pub customer_email: Option<String>,
    pub order: Option<Order>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub success: bool,
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchQuery {
    pub email: Option<String>,
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

//--------------------------------------      Tracking       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub data: TrackingSnapshot,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTrackingStatusRequest {
    pub status: DeliveryStatus,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub message: Option<String>,
    /// A rider assignment bundled with the status update, applied first.
    #[serde(default)]
    pub rider: Option<RiderDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdateRequest {
    pub location: GeoPoint,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub lng: f64,
    pub lat: f64,
    /// Meters; defaults to 5 km.
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingHistoryResponse {
    pub success: bool,
    pub history: Vec<TrackingEntry>,
    pub current_status: DeliveryStatus,
    pub progress_percentage: u8,
    pub time_remaining_secs: i64,
    pub actual_delivery_time: Option<DateTime<Utc>>,
}
