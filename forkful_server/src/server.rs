use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_tools::CheckoutApi;
use forkful_engine::{
    events::{EventHandlers, EventProducers},
    CustomerApi,
    RiderMatcherApi,
    SettlementApi,
    SqliteDatabase,
    TrackingApi,
};
use log::info;

use crate::{
    checkout_routes::{
        CheckoutWebhookRoute,
        OpenCheckoutSessionRoute,
        OrderFromPaymentRoute,
        SessionDetailsRoute,
    },
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::checkout::CheckoutGateway,
    live_updates::{live_channel, live_update_hooks, LiveUpdates},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        ActiveTrackingsRoute,
        CreateTrackingRoute,
        CustomerOrdersRoute,
        NearbyOrdersRoute,
        OrderByIdRoute,
        SearchOrdersRoute,
        TrackingForOrderRoute,
        TrackingHistoryRoute,
        UpdateOrderStatusRoute,
        UpdateRiderLocationRoute,
        UpdateTrackingStatusRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = CheckoutApi::new(config.checkout.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = CheckoutGateway::new(api, &config.frontend_url);

    // Realtime fan-out: engine events flow through the hook handlers into the per-channel broadcast registry.
    let live = Arc::new(LiveUpdates::new());
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, live_update_hooks(live.clone()));
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let _expiry = start_expiry_worker(
        db.clone(),
        gateway.clone(),
        producers.clone(),
        config.pricing,
        config.pending_order_timeout,
    );

    let srv = create_server_instance(config, db, gateway, producers, live)?;
    info!("🚀️ Server is running");
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: CheckoutGateway,
    producers: EventProducers,
    live: Arc<LiveUpdates>,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(db.clone(), gateway.clone(), config.pricing, producers.clone());
        let tracking_api = TrackingApi::new(db.clone(), config.origin.clone(), producers.clone());
        let matcher_api = RiderMatcherApi::new(db.clone());
        let customer_api = CustomerApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fdg::access_log"))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(tracking_api))
            .app_data(web::Data::new(matcher_api))
            .app_data(web::Data::new(customer_api))
            .app_data(web::Data::from(live.clone()));
        // The webhook gets its own scope so the signature check wraps it and nothing else.
        let webhook_scope = web::scope("/checkout/webhook")
            .wrap(HmacMiddlewareFactory::new(
                &config.webhook_signature_header,
                config.checkout.webhook_secret.clone(),
                config.webhook_signature_checks,
            ))
            .service(CheckoutWebhookRoute::<SqliteDatabase, CheckoutGateway>::new());
        let checkout_scope = web::scope("/checkout")
            .service(OpenCheckoutSessionRoute::<SqliteDatabase, CheckoutGateway>::new())
            .service(SessionDetailsRoute::<SqliteDatabase, CheckoutGateway>::new())
            .service(OrderFromPaymentRoute::<SqliteDatabase, CheckoutGateway>::new());
        app.service(health)
            .service(webhook_scope)
            .service(checkout_scope)
            .service(OrderByIdRoute::<SqliteDatabase, CheckoutGateway>::new())
            .service(SearchOrdersRoute::<SqliteDatabase, CheckoutGateway>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, CheckoutGateway>::new())
            .service(CustomerOrdersRoute::<SqliteDatabase>::new())
            .service(CreateTrackingRoute::<SqliteDatabase>::new())
            .service(TrackingForOrderRoute::<SqliteDatabase>::new())
            .service(UpdateTrackingStatusRoute::<SqliteDatabase>::new())
            .service(UpdateRiderLocationRoute::<SqliteDatabase>::new())
            .service(ActiveTrackingsRoute::<SqliteDatabase>::new())
            .service(NearbyOrdersRoute::<SqliteDatabase>::new())
            .service(TrackingHistoryRoute::<SqliteDatabase>::new())
            .service(live_channel)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
