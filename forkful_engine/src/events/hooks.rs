use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderPaidEvent,
    RiderLocationEvent,
    TrackingStatusEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub tracking_status_producer: Vec<EventProducer<TrackingStatusEvent>>,
    pub rider_location_producer: Vec<EventProducer<RiderLocationEvent>>,
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_tracking_status: Option<EventHandler<TrackingStatusEvent>>,
    pub on_rider_location: Option<EventHandler<RiderLocationEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_tracking_status = hooks.on_tracking_status.map(|f| EventHandler::new(buffer_size, f));
        let on_rider_location = hooks.on_rider_location.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_tracking_status, on_rider_location }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_tracking_status {
            result.tracking_status_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_rider_location {
            result.rider_location_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_tracking_status {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_rider_location {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_tracking_status: Option<Handler<TrackingStatusEvent>>,
    pub on_rider_location: Option<Handler<RiderLocationEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_tracking_status<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TrackingStatusEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_tracking_status = Some(Arc::new(f));
        self
    }

    pub fn on_rider_location<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RiderLocationEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_rider_location = Some(Arc::new(f));
        self
    }
}
