//! Realtime fan-out to connected clients.
//!
//! `LiveUpdates` is a per-channel broadcast registry: engine event hooks publish into it, and clients subscribe to
//! their own channel (`user:<id>` or `rider:<id>`) over an SSE stream. Delivery is best-effort with no
//! acknowledgment — a slow consumer is allowed to lag and lose messages; every event payload is denormalized enough
//! that the next one makes the client whole again.
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

use actix_web::{get, web, HttpResponse, Responder};
use forkful_engine::events::EventHooks;
use log::*;
use serde_json::json;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct LiveUpdates {
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl LiveUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes an event to a channel. A channel with no subscribers swallows the event silently.
    pub fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) {
        let message = json!({ "event": event, "payload": payload }).to_string();
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = channels.get(channel) {
            match sender.send(message) {
                Ok(n) => trace!("📡️ '{event}' delivered to {n} subscribers on {channel}"),
                Err(_) => trace!("📡️ '{event}' on {channel} had no subscribers"),
            }
        }
    }

    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels.entry(channel.to_string()).or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0).subscribe()
    }
}

/// Builds the engine event hooks that forward every settlement and tracking event into the broadcast registry,
/// keyed by the channel the event names. Event names match what the storefront and rider apps listen for.
pub fn live_update_hooks(live: Arc<LiveUpdates>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let sink = live.clone();
    hooks.on_order_paid(move |ev| {
        let sink = sink.clone();
        Box::pin(async move {
            if let Some(channel) = ev.channel() {
                let payload = serde_json::to_value(&ev.order).unwrap_or_default();
                sink.publish(&channel.to_string(), "orderPaid", payload);
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let sink = live.clone();
    hooks.on_tracking_status(move |ev| {
        let sink = sink.clone();
        Box::pin(async move {
            let payload = json!({
                "orderId": ev.order_id,
                "message": ev.message,
                "tracking": serde_json::to_value(&ev.snapshot).unwrap_or_default(),
            });
            sink.publish(&ev.channel.to_string(), "orderStatusUpdate", payload);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let sink = live;
    hooks.on_rider_location(move |ev| {
        let sink = sink.clone();
        Box::pin(async move {
            let payload = json!({
                "orderId": ev.order_id,
                "location": { "coordinates": [ev.location.lng, ev.location.lat], "heading": ev.heading, "speed": ev.speed },
                "riderInfo": serde_json::to_value(&ev.rider_info).unwrap_or_default(),
                "estimatedTimeRemaining": ev.time_remaining_secs,
            });
            sink.publish(&ev.channel.to_string(), "riderLocationUpdate", payload);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

/// SSE stream of events for one channel. Lagged subscribers skip ahead; the stream ends when the server shuts the
/// channel down.
#[get("/live/{channel}")]
pub async fn live_channel(path: web::Path<String>, live: web::Data<LiveUpdates>) -> impl Responder {
    let channel = path.into_inner();
    debug!("📡️ New live subscriber on {channel}");
    let receiver = live.subscribe(&channel);
    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    let frame = web::Bytes::from(format!("data: {message}\n\n"));
                    return Some((Ok::<_, actix_web::Error>(frame), receiver));
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!("📡️ Subscriber lagged, {skipped} events skipped");
                    continue;
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_only_the_right_channel() {
        let live = LiveUpdates::new();
        let mut user = live.subscribe("user:1");
        let mut rider = live.subscribe("rider:1");
        live.publish("user:1", "orderStatusUpdate", json!({"orderId": 7}));
        let msg = user.recv().await.unwrap();
        assert!(msg.contains("orderStatusUpdate"));
        assert!(rider.try_recv().is_err());
    }

    #[tokio::test]
    async fn publishing_to_an_unknown_channel_is_a_no_op() {
        let live = LiveUpdates::new();
        live.publish("user:999", "orderPaid", json!({}));
    }
}
