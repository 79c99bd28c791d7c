use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    api::tracking_objects::TrackingSnapshot,
    db_types::{GeoPoint, Order, RiderInfo},
};

//--------------------------------------     ChannelKey      ---------------------------------------------------------
/// Realtime routing key. Subscribers listen on a channel; events carry the channel they should be fanned out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKey {
    Customer(i64),
    Rider(i64),
}

impl Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKey::Customer(id) => write!(f, "user:{id}"),
            ChannelKey::Rider(id) => write!(f, "rider:{id}"),
        }
    }
}

//--------------------------------------    OrderPaidEvent   ---------------------------------------------------------
/// Emitted exactly once per order, by whichever materialization call performed the paid transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    pub fn channel(&self) -> Option<ChannelKey> {
        self.order.customer_id.map(ChannelKey::Customer)
    }
}

//-------------------------------------- TrackingStatusEvent ---------------------------------------------------------
/// Emitted after every persisted tracking state change. The snapshot is denormalized — current record plus derived
/// progress and time remaining — so a subscriber never needs a follow-up fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingStatusEvent {
    pub channel: ChannelKey,
    pub order_id: i64,
    pub snapshot: TrackingSnapshot,
    pub message: Option<String>,
}

//--------------------------------------  RiderLocationEvent ---------------------------------------------------------
/// A location-only update: the rider moved, nothing else changed. Carries the recomputed time remaining but does
/// not represent a status transition and never appears in tracking history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderLocationEvent {
    pub channel: ChannelKey,
    pub order_id: i64,
    pub location: GeoPoint,
    pub heading: f64,
    pub speed: f64,
    pub rider_info: RiderInfo,
    pub time_remaining_secs: i64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channel_keys_are_namespaced() {
        assert_eq!(ChannelKey::Customer(12).to_string(), "user:12");
        assert_eq!(ChannelKey::Rider(7).to_string(), "rider:7");
    }
}
