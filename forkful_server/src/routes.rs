//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (I/O,
//! database and gateway calls) must be awaited, never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use forkful_engine::{
    api::{order_objects::OrderQueryFilter, tracking_objects::TrackingSnapshot},
    db_types::{GeoPoint, NewTracking},
    traits::{CustomerManagement, PaymentSessionSource, SettlementDatabase, TrackingDatabase},
    CustomerApi,
    RiderMatcherApi,
    SettlementApi,
    TrackingApi,
};
use log::*;

use crate::{
    data_objects::{
        JsonResponse,
        LocationUpdateRequest,
        NearbyQuery,
        OrderResponse,
        OrderSearchQuery,
        TrackingHistoryResponse,
        TrackingResponse,
        UpdateOrderStatusRequest,
        UpdateTrackingStatusRequest,
    },
    errors::ServerError,
};

const DEFAULT_NEARBY_RADIUS_M: f64 = 5_000.0;

// Actix cannot handle generics in handlers, so routes are registered through a macro that pairs each generic
// handler with a concrete HttpServiceFactory.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_by_id => Get "/orders/{id}" impl SettlementDatabase, PaymentSessionSource);
pub async fn order_by_id<B, S>(
    path: web::Path<i64>,
    api: web::Data<SettlementApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let id = path.into_inner();
    debug!("💻️ GET order {id}");
    let order = api.fetch_order(id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(search_orders => Get "/orders" impl SettlementDatabase, PaymentSessionSource);
pub async fn search_orders<B, S>(
    query: web::Query<OrderSearchQuery>,
    api: web::Data<SettlementApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let query = query.into_inner();
    debug!("💻️ GET orders matching {query:?}");
    let mut filter = OrderQueryFilter::default();
    if let Some(email) = query.email {
        filter = filter.with_email(email);
    }
    if let Some(customer_id) = query.customer_id {
        filter = filter.with_customer_id(customer_id);
    }
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(update_order_status => Post "/orders/{id}/status" impl SettlementDatabase, PaymentSessionSource);
/// Owner/admin lifecycle edits (cancel, ship, complete). Settlement owns the paid transition; this endpoint never
/// touches payment state.
pub async fn update_order_status<B, S>(
    path: web::Path<i64>,
    body: web::Json<UpdateOrderStatusRequest>,
    api: web::Data<SettlementApi<B, S>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    let id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ POST order {id} status → {status}");
    let order = api.update_order_status(id, status).await?;
    Ok(HttpResponse::Ok().json(OrderResponse {
        success: true,
        message: "Order status updated successfully".to_string(),
        order,
    }))
}

route!(customer_orders => Get "/customers/{customer_id}/orders" impl CustomerManagement);
pub async fn customer_orders<B: CustomerManagement>(
    path: web::Path<i64>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET orders for customer {customer_id}");
    let customer = api.customer(customer_id).await?;
    let orders = api.orders_for_customer(customer.id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------  Tracking  ----------------------------------------------------
route!(create_tracking => Post "/tracking" impl TrackingDatabase);
pub async fn create_tracking<B: TrackingDatabase>(
    body: web::Json<NewTracking>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let new_tracking = body.into_inner();
    debug!("💻️ POST create tracking for order {}", new_tracking.order_id);
    let tracking = api.create(new_tracking).await?;
    let snapshot = TrackingSnapshot::new(tracking, Utc::now());
    Ok(HttpResponse::Created().json(TrackingResponse {
        success: true,
        data: snapshot,
        message: "Order tracking created successfully".to_string(),
    }))
}

route!(tracking_for_order => Get "/tracking/order/{order_id}" impl TrackingDatabase);
pub async fn tracking_for_order<B: TrackingDatabase>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET tracking for order {order_id}");
    let tracking = api.tracking_for_order(order_id).await?;
    let snapshot = TrackingSnapshot::new(tracking, Utc::now());
    Ok(HttpResponse::Ok().json(TrackingResponse {
        success: true,
        data: snapshot,
        message: "Order tracking retrieved successfully".to_string(),
    }))
}

route!(update_tracking_status => Put "/tracking/status/{order_id}" impl TrackingDatabase);
/// Applies a status transition, optionally preceded by a rider assignment bundled into the same request.
pub async fn update_tracking_status<B: TrackingDatabase>(
    path: web::Path<i64>,
    body: web::Json<UpdateTrackingStatusRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let request = body.into_inner();
    debug!("💻️ PUT tracking status for order {order_id} → {}", request.status);
    if let Some(rider) = request.rider {
        api.assign_rider(order_id, rider).await?;
    }
    let tracking = api.update_status(order_id, request.status, request.location, request.message).await?;
    let snapshot = TrackingSnapshot::new(tracking, Utc::now());
    Ok(HttpResponse::Ok().json(TrackingResponse {
        success: true,
        data: snapshot,
        message: "Order status updated successfully".to_string(),
    }))
}

route!(update_rider_location => Put "/tracking/location/{order_id}" impl TrackingDatabase);
pub async fn update_rider_location<B: TrackingDatabase>(
    path: web::Path<i64>,
    body: web::Json<LocationUpdateRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let request = body.into_inner();
    trace!("💻️ PUT rider location for order {order_id}");
    api.update_location(order_id, request.location, request.heading, request.speed).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Rider location updated successfully")))
}

route!(active_trackings => Get "/tracking/customer/{customer_id}/active" impl TrackingDatabase);
pub async fn active_trackings<B: TrackingDatabase>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    trace!("💻️ GET active trackings for customer {customer_id}");
    let now = Utc::now();
    let snapshots: Vec<TrackingSnapshot> = api
        .active_trackings_for_customer(customer_id)
        .await?
        .into_iter()
        .map(|t| TrackingSnapshot::new(t, now))
        .collect();
    Ok(HttpResponse::Ok().json(snapshots))
}

route!(nearby_orders => Get "/tracking/nearby" impl TrackingDatabase);
pub async fn nearby_orders<B: TrackingDatabase>(
    query: web::Query<NearbyQuery>,
    matcher: web::Data<RiderMatcherApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    let point = GeoPoint::new(query.lng, query.lat);
    let radius = query.max_distance.unwrap_or(DEFAULT_NEARBY_RADIUS_M);
    if radius <= 0.0 {
        return Err(ServerError::ValidationError("max_distance must be positive".to_string()));
    }
    debug!("💻️ GET nearby orders around {point} within {radius}m");
    let matches = matcher.find_nearby(point, radius).await?;
    Ok(HttpResponse::Ok().json(matches))
}

route!(tracking_history => Get "/tracking/history/{order_id}" impl TrackingDatabase);
pub async fn tracking_history<B: TrackingDatabase>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET tracking history for order {order_id}");
    let tracking = api.tracking_for_order(order_id).await?;
    let history = api.history_for_order(order_id).await?;
    Ok(HttpResponse::Ok().json(TrackingHistoryResponse {
        success: true,
        history,
        current_status: tracking.status,
        progress_percentage: tracking.progress_percentage(),
        time_remaining_secs: tracking.time_remaining(Utc::now()).num_seconds(),
        actual_delivery_time: tracking.delivered_at,
    }))
}
