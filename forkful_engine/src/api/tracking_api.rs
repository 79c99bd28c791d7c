use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::tracking_objects::TrackingSnapshot,
    db_types::{DeliveryStatus, GeoPoint, NewTracking, RestaurantOrigin, RiderDescriptor, Tracking, TrackingEntry},
    events::{ChannelKey, EventProducers, RiderLocationEvent, TrackingStatusEvent},
    traits::{TrackingDatabase, TrackingError},
};

/// `TrackingApi` owns the delivery lifecycle of an order: creation, status transitions, rider assignment and live
/// location. Every state change is persisted first and published second; publication is fire-and-forget and never
/// fails the operation that triggered it.
pub struct TrackingApi<B> {
    db: B,
    origin: RestaurantOrigin,
    producers: EventProducers,
}

impl<B> Debug for TrackingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrackingApi")
    }
}

impl<B> TrackingApi<B> {
    pub fn new(db: B, origin: RestaurantOrigin, producers: EventProducers) -> Self {
        Self { db, origin, producers }
    }
}

impl<B> TrackingApi<B>
where B: TrackingDatabase
{
    /// Creates the tracking record for an order. The store's unique order constraint rejects a second creation.
    /// History starts with a single `Placed` entry at the restaurant origin, and the customer channel is notified.
    pub async fn create(&self, tracking: NewTracking) -> Result<Tracking, TrackingError> {
        let tracking = self.db.create_tracking(tracking, &self.origin).await?;
        info!("🛵️ Tracking #{} created for order #{}", tracking.id, tracking.order_id);
        self.publish_status(&tracking, Some("Order has been placed successfully".to_string())).await;
        Ok(tracking)
    }

    /// Applies a status transition and fans the updated snapshot out to the customer channel, and to the rider
    /// channel when a rider is assigned. Transitions out of a terminal state are rejected by the store and nothing
    /// is published.
    pub async fn update_status(
        &self,
        order_id: i64,
        status: DeliveryStatus,
        location: Option<GeoPoint>,
        message: Option<String>,
    ) -> Result<Tracking, TrackingError> {
        let tracking = self.db.update_tracking_status(order_id, status, location, message.clone()).await?;
        debug!("🛵️ Order #{order_id} delivery status set to {status}");
        self.publish_status(&tracking, message).await;
        Ok(tracking)
    }

    /// Assigns a rider and embeds the denormalized rider info snapshot. May be combined with a status update in a
    /// single request at the HTTP layer; the two operations publish independently.
    pub async fn assign_rider(&self, order_id: i64, rider: RiderDescriptor) -> Result<Tracking, TrackingError> {
        let tracking = self.db.assign_rider(order_id, rider).await?;
        info!("🛵️ Rider #{:?} assigned to order #{order_id}", tracking.rider_id);
        self.publish_status(&tracking, Some("A delivery partner has been assigned".to_string())).await;
        Ok(tracking)
    }

    /// Records a rider movement. Publishes a location-only event (not a status event) to the customer channel with
    /// the time remaining recomputed; history is untouched.
    pub async fn update_location(
        &self,
        order_id: i64,
        location: GeoPoint,
        heading: f64,
        speed: f64,
    ) -> Result<Tracking, TrackingError> {
        let tracking = self.db.update_rider_location(order_id, location).await?;
        trace!("🛵️ Order #{order_id} rider moved to {location}");
        let event = RiderLocationEvent {
            channel: ChannelKey::Customer(tracking.customer_id),
            order_id,
            location,
            heading,
            speed,
            rider_info: tracking.rider_info.clone(),
            time_remaining_secs: tracking.time_remaining(Utc::now()).num_seconds(),
        };
        for producer in &self.producers.rider_location_producer {
            producer.publish_event(event.clone()).await;
        }
        Ok(tracking)
    }

    pub async fn tracking_for_order(&self, order_id: i64) -> Result<Tracking, TrackingError> {
        self.db.fetch_tracking_for_order(order_id).await?.ok_or(TrackingError::TrackingNotFound(order_id))
    }

    pub async fn history_for_order(&self, order_id: i64) -> Result<Vec<TrackingEntry>, TrackingError> {
        self.db.fetch_history_for_order(order_id).await
    }

    pub async fn active_trackings_for_customer(&self, customer_id: i64) -> Result<Vec<Tracking>, TrackingError> {
        self.db.fetch_active_trackings_for_customer(customer_id).await
    }

    async fn publish_status(&self, tracking: &Tracking, message: Option<String>) {
        let snapshot = TrackingSnapshot::new(tracking.clone(), Utc::now());
        let mut events = vec![TrackingStatusEvent {
            channel: ChannelKey::Customer(tracking.customer_id),
            order_id: tracking.order_id,
            snapshot: snapshot.clone(),
            message: message.clone(),
        }];
        if let Some(rider_id) = tracking.rider_id {
            events.push(TrackingStatusEvent {
                channel: ChannelKey::Rider(rider_id),
                order_id: tracking.order_id,
                snapshot,
                message,
            });
        }
        for event in events {
            for producer in &self.producers.tracking_status_producer {
                producer.publish_event(event.clone()).await;
            }
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
