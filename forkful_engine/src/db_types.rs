use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use fdg_common::Paise;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

use crate::helpers::geo::haversine_m;

//--------------------------------------      SessionId      ---------------------------------------------------------
/// A lightweight wrapper around the payment gateway's checkout-session identifier. At most one order can ever exist
/// for a given session id; the store enforces this with a unique index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct SessionId(pub String);

impl FromStr for SessionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   ConversionError   ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// The order exists as a placeholder; payment has not completed yet.
    Pending,
    /// The order is paid and being prepared.
    Processing,
    /// The order has been handed to a rider.
    Shipped,
    /// The order has been delivered.
    Delivered,
    /// The order is paid and settled. Orders materialized from a completed session land here.
    Completed,
    /// The order has been cancelled by the owner or an administrator.
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
    Succeeded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Succeeded => "Succeeded",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            "Succeeded" => Ok(Self::Succeeded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    DeliveryStatus   ---------------------------------------------------------
/// The delivery state machine. The canonical forward path is
/// `Placed → Confirmed → Preparing → ReadyForPickup → OutForDelivery → Delivered`, with `Cancelled` reachable from
/// any non-terminal state. Transitions between non-terminal states are not ordered by the store; transitions *out*
/// of a terminal state are rejected so that history stays monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Placed,
    Confirmed,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Share of the delivery considered complete at this status. Fixed table; not persisted.
    pub fn progress_percentage(&self) -> u8 {
        match self {
            DeliveryStatus::Placed => 10,
            DeliveryStatus::Confirmed => 25,
            DeliveryStatus::Preparing => 40,
            DeliveryStatus::ReadyForPickup => 55,
            DeliveryStatus::OutForDelivery => 75,
            DeliveryStatus::Delivered => 100,
            DeliveryStatus::Cancelled => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Placed => "Placed",
            DeliveryStatus::Confirmed => "Confirmed",
            DeliveryStatus::Preparing => "Preparing",
            DeliveryStatus::ReadyForPickup => "ReadyForPickup",
            DeliveryStatus::OutForDelivery => "OutForDelivery",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for DeliveryStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" => Ok(Self::Placed),
            "Confirmed" => Ok(Self::Confirmed),
            "Preparing" => Ok(Self::Preparing),
            "ReadyForPickup" => Ok(Self::ReadyForPickup),
            "OutForDelivery" => Ok(Self::OutForDelivery),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid delivery status: {s}"))),
        }
    }
}

//--------------------------------------       GeoPoint      ---------------------------------------------------------
/// A geographic point in longitude/latitude order, matching the store's coordinate convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        haversine_m(self, other)
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
/// A single line item on an order. Stored embedded in the order record as a JSON document, the way the cart surface
/// also stores its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: Option<i64>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Paise,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Paise {
        self.unit_price * i64::from(self.quantity)
    }
}

//--------------------------------------   ShippingAddress   ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub session_id: Option<SessionId>,
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<i64>,
    pub items: Json<Vec<OrderItem>>,
    pub shipping_address: Json<ShippingAddress>,
    pub payment_method: String,
    pub items_price: Paise,
    pub tax_price: Paise,
    pub shipping_price: Paise,
    pub discount: Paise,
    pub total_price: Paise,
    pub email: Option<String>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub session_id: Option<SessionId>,
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<i64>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: Paise,
    pub tax_price: Paise,
    pub shipping_price: Paise,
    pub discount: Paise,
    pub total_price: Paise,
    pub email: Option<String>,
    pub is_paid: bool,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub promo_code: Option<String>,
}

impl NewOrder {
    /// A pending placeholder order, inserted optimistically while the customer is still at the payment page.
    pub fn placeholder(session_id: SessionId, items: Vec<OrderItem>, shipping_address: ShippingAddress) -> Self {
        Self {
            session_id: Some(session_id),
            payment_intent_id: None,
            customer_id: None,
            items,
            shipping_address,
            payment_method: "Credit Card".to_string(),
            items_price: Paise::default(),
            tax_price: Paise::default(),
            shipping_price: Paise::default(),
            discount: Paise::default(),
            total_price: Paise::default(),
            email: None,
            is_paid: false,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            promo_code: None,
        }
    }

    pub fn with_totals(mut self, items_price: Paise, tax_price: Paise, shipping_price: Paise) -> Self {
        self.items_price = items_price;
        self.tax_price = tax_price;
        self.shipping_price = shipping_price;
        self.total_price = items_price + tax_price + shipping_price - self.discount;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_customer(mut self, customer_id: Option<i64>) -> Self {
        self.customer_id = customer_id;
        self
    }

    /// Marks the new order as settled at insert time. Used when materialization runs with no prior placeholder.
    pub fn paid(mut self, payment_intent_id: Option<String>) -> Self {
        self.payment_intent_id = payment_intent_id;
        self.is_paid = true;
        self.status = OrderStatus::Completed;
        self.payment_status = PaymentStatus::Paid;
        self
    }
}

//--------------------------------------    PaymentUpdate    ---------------------------------------------------------
/// Fields resolved during settlement that are back-filled onto a placeholder order when it transitions to paid.
/// Every field only ever fills a hole; existing values are never overwritten.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<i64>,
    pub email: Option<String>,
}

//--------------------------------------      Customer       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Cart         ---------------------------------------------------------
/// The per-customer cart document. It is mutated by the cart-management surface and, exactly once per order, by the
/// settlement flow (which empties it on the paid transition).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub customer_id: i64,
    pub items: Json<Vec<OrderItem>>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     VehicleType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Bike,
    Car,
    Bicycle,
    Scooter,
}

impl Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VehicleType::Bike => "bike",
            VehicleType::Car => "car",
            VehicleType::Bicycle => "bicycle",
            VehicleType::Scooter => "scooter",
        };
        write!(f, "{s}")
    }
}

impl FromStr for VehicleType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bike" => Ok(Self::Bike),
            "car" => Ok(Self::Car),
            "bicycle" => Ok(Self::Bicycle),
            "scooter" => Ok(Self::Scooter),
            s => Err(ConversionError(format!("Invalid vehicle type: {s}"))),
        }
    }
}

//--------------------------------------      RiderInfo      ---------------------------------------------------------
/// Denormalized rider display data embedded on the tracking record, so clients can render the rider card without a
/// join against the user store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderInfo {
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
}

//--------------------------------------   RiderDescriptor   ---------------------------------------------------------
/// Payload for assigning a rider to a tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderDescriptor {
    pub rider_id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub vehicle_number: String,
}

impl RiderDescriptor {
    pub fn info(&self) -> RiderInfo {
        RiderInfo {
            name: self.name.clone(),
            phone: self.phone.clone(),
            vehicle_type: self.vehicle_type,
            vehicle_number: self.vehicle_number.clone(),
        }
    }
}

//-------------------------------------- RestaurantOrigin    ---------------------------------------------------------
/// The fixed pickup origin every delivery starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantOrigin {
    pub location: GeoPoint,
    pub address: String,
}

impl Default for RestaurantOrigin {
    fn default() -> Self {
        Self { location: GeoPoint::new(77.2090, 28.6139), address: "Forkful Restaurant, Delhi".to_string() }
    }
}

//--------------------------------------      Tracking       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracking {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub rider_id: Option<i64>,
    pub rider_info: RiderInfo,
    pub status: DeliveryStatus,
    pub current_location: GeoPoint,
    pub destination: GeoPoint,
    pub destination_address: String,
    pub origin: GeoPoint,
    pub origin_address: String,
    pub eta: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tracking {
    pub fn progress_percentage(&self) -> u8 {
        self.status.progress_percentage()
    }

    /// Time remaining until the estimated delivery time, clamped at zero, and forced to zero once delivered.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.status == DeliveryStatus::Delivered {
            return Duration::zero();
        }
        (self.eta - now).max(Duration::zero())
    }
}

// The store keeps locations as flat lng/lat column pairs, so the row mapping is written out by hand.
#[cfg(feature = "sqlite")]
impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for Tracking {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            customer_id: row.try_get("customer_id")?,
            rider_id: row.try_get("rider_id")?,
            rider_info: RiderInfo {
                name: row.try_get("rider_name")?,
                phone: row.try_get("rider_phone")?,
                vehicle_type: row.try_get("rider_vehicle_type")?,
                vehicle_number: row.try_get("rider_vehicle_number")?,
            },
            status: row.try_get("status")?,
            current_location: GeoPoint::new(row.try_get("current_lng")?, row.try_get("current_lat")?),
            destination: GeoPoint::new(row.try_get("dest_lng")?, row.try_get("dest_lat")?),
            destination_address: row.try_get("dest_address")?,
            origin: GeoPoint::new(row.try_get("origin_lng")?, row.try_get("origin_lat")?),
            origin_address: row.try_get("origin_address")?,
            eta: row.try_get("eta")?,
            delivered_at: row.try_get("delivered_at")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------     NewTracking     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTracking {
    pub order_id: i64,
    pub customer_id: i64,
    pub destination: GeoPoint,
    pub destination_address: String,
    pub eta: DateTime<Utc>,
}

//--------------------------------------    TrackingEntry    ---------------------------------------------------------
/// One row of the append-only tracking history. Entries are only ever inserted; the store orders them by timestamp
/// with the insertion id breaking ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub id: i64,
    pub tracking_id: i64,
    pub status: DeliveryStatus,
    pub location: Option<GeoPoint>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(feature = "sqlite")]
impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for TrackingEntry {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let lng: Option<f64> = row.try_get("lng")?;
        let lat: Option<f64> = row.try_get("lat")?;
        let location = match (lng, lat) {
            (Some(lng), Some(lat)) => Some(GeoPoint::new(lng, lat)),
            _ => None,
        };
        Ok(Self {
            id: row.try_get("id")?,
            tracking_id: row.try_get("tracking_id")?,
            status: row.try_get("status")?,
            location,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn progress_table() {
        assert_eq!(DeliveryStatus::Placed.progress_percentage(), 10);
        assert_eq!(DeliveryStatus::Confirmed.progress_percentage(), 25);
        assert_eq!(DeliveryStatus::Preparing.progress_percentage(), 40);
        assert_eq!(DeliveryStatus::ReadyForPickup.progress_percentage(), 55);
        assert_eq!(DeliveryStatus::OutForDelivery.progress_percentage(), 75);
        assert_eq!(DeliveryStatus::Delivered.progress_percentage(), 100);
        assert_eq!(DeliveryStatus::Cancelled.progress_percentage(), 0);
    }

    #[test]
    fn progress_is_monotonic_along_forward_path() {
        use DeliveryStatus::*;
        let path = [Placed, Confirmed, Preparing, ReadyForPickup, OutForDelivery, Delivered];
        let mut last = 0;
        for status in path {
            let p = status.progress_percentage();
            assert!(p >= last, "{status} regressed from {last} to {p}");
            last = p;
        }
    }

    #[test]
    fn terminal_states() {
        assert!(DeliveryStatus::Delivered.is_terminal());
        assert!(DeliveryStatus::Cancelled.is_terminal());
        assert!(!DeliveryStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn status_roundtrip() {
        for s in ["Placed", "Confirmed", "Preparing", "ReadyForPickup", "OutForDelivery", "Delivered", "Cancelled"] {
            let status: DeliveryStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("delivered".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn line_totals() {
        let item = OrderItem {
            product_id: Some(7),
            name: "Paneer Tikka".to_string(),
            quantity: 3,
            unit_price: Paise::from_rupees(120),
            image_url: None,
        };
        assert_eq!(item.line_total(), Paise::from_rupees(360));
    }

    #[test]
    fn time_remaining_is_clamped_and_zero_after_delivery() {
        let now = Utc::now();
        let mut tracking = Tracking {
            id: 1,
            order_id: 1,
            customer_id: 1,
            rider_id: None,
            rider_info: RiderInfo::default(),
            status: DeliveryStatus::OutForDelivery,
            current_location: GeoPoint::new(77.2090, 28.6139),
            destination: GeoPoint::new(77.2310, 28.6129),
            destination_address: "42 Lodhi Road".to_string(),
            origin: GeoPoint::new(77.2090, 28.6139),
            origin_address: "Forkful Restaurant, Delhi".to_string(),
            eta: now + Duration::minutes(20),
            delivered_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(tracking.time_remaining(now), Duration::minutes(20));
        assert_eq!(tracking.time_remaining(now + Duration::minutes(45)), Duration::zero());
        tracking.status = DeliveryStatus::Delivered;
        assert_eq!(tracking.time_remaining(now), Duration::zero());
    }
}
