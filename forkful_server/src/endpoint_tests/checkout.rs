use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use fdg_common::Secret;
use forkful_engine::{
    api::order_objects::PricingPolicy,
    db_types::SessionId,
    events::EventProducers,
    traits::{SessionData, SessionHandle, SettlementError},
    SettlementApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{post_request, sample_item, sample_order},
    mocks::{MockGateway, MockOrderStore},
};
use crate::{
    checkout_routes::{CheckoutWebhookRoute, OpenCheckoutSessionRoute, OrderFromPaymentRoute, SessionDetailsRoute},
    helpers::calculate_hmac,
    middleware::HmacMiddlewareFactory,
    routes::OrderByIdRoute,
};

const WEBHOOK_SECRET: &str = "whsec_test";
const SIGNATURE_HEADER: &str = "X-Checkout-Signature";

fn configure_with<FS, FG>(setup_store: FS, setup_gateway: FG) -> impl FnOnce(&mut ServiceConfig)
where
    FS: FnOnce(&mut MockOrderStore),
    FG: FnOnce(&mut MockGateway),
{
    let mut store = MockOrderStore::new();
    setup_store(&mut store);
    let mut gateway = MockGateway::new();
    setup_gateway(&mut gateway);
    move |cfg: &mut ServiceConfig| {
        let api = SettlementApi::new(store, gateway, PricingPolicy::default(), EventProducers::default());
        let webhook_scope = web::scope("/checkout/webhook")
            .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, Secret::new(WEBHOOK_SECRET.to_string()), false))
            .service(CheckoutWebhookRoute::<MockOrderStore, MockGateway>::new());
        let checkout_scope = web::scope("/checkout")
            .service(OpenCheckoutSessionRoute::<MockOrderStore, MockGateway>::new())
            .service(SessionDetailsRoute::<MockOrderStore, MockGateway>::new())
            .service(OrderFromPaymentRoute::<MockOrderStore, MockGateway>::new());
        cfg.service(webhook_scope)
            .service(checkout_scope)
            .service(OrderByIdRoute::<MockOrderStore, MockGateway>::new())
            .app_data(web::Data::new(api));
    }
}

fn open_session_body() -> Value {
    json!({
        "cart_items": [sample_item()],
        "shipping": {
            "address": "42 Lodhi Road",
            "city": "New Delhi",
            "postal_code": "110003",
            "country": "India"
        },
        "customer_email": "diner@example.com"
    })
}

fn completed_webhook_body(session_id: &str) -> Value {
    json!({
        "type": "checkout.completed",
        "session": {
            "id": session_id,
            "payment_status": "paid",
            "payment_intent": "pi_hook",
            "customer_email": "diner@example.com",
            "metadata": {}
        }
    })
}

#[actix_web::test]
async fn open_session_returns_the_redirect_handle() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |store| {
            store
                .expect_insert_pending_order()
                .times(1)
                .returning(|_| Ok((sample_order(1, "cs_new", false), true)));
        },
        |gateway| {
            gateway.expect_create_session().times(1).returning(|request| {
                assert_eq!(request.customer_email, "diner@example.com");
                // totals were re-derived server-side and attached as correlation data
                assert_eq!(request.metadata["subtotal"], "40000");
                assert_eq!(request.metadata["delivery_charge"], "5000");
                Ok(SessionHandle {
                    session_id: SessionId::from("cs_new"),
                    redirect_url: Some("https://gateway.example.com/pay/cs_new".to_string()),
                })
            });
        },
    );
    let (status, body) = post_request("/checkout/session", &open_session_body(), configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["session_id"], "cs_new");
    assert_eq!(json["url"], "https://gateway.example.com/pay/cs_new");
}

#[actix_web::test]
async fn open_session_with_an_empty_cart_is_rejected() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(|_| {}, |_| {});
    let body = json!({
        "cart_items": [],
        "shipping": {"address": "a", "city": "b", "postal_code": "c", "country": "d"},
        "customer_email": "diner@example.com"
    });
    let (status, body) = post_request("/checkout/session", &body, configure).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Cart is empty"));
}

#[actix_web::test]
async fn webhook_ignores_other_event_types() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(|_| {}, |_| {});
    let body = json!({
        "type": "payment_method.attached",
        "session": {"id": "cs_x", "payment_status": "unpaid"}
    });
    let (status, body) = post_request("/checkout/webhook", &body, configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Event ignored"));
}

#[actix_web::test]
async fn webhook_settles_a_pending_placeholder() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |store| {
            store
                .expect_fetch_order_by_session()
                .times(1)
                .returning(|id| Ok(Some(sample_order(5, id.as_str(), false))));
            store.expect_fetch_customer_by_email().returning(|_| Ok(None));
            store
                .expect_mark_order_paid()
                .times(1)
                .returning(|id, _| Ok((sample_order(5, id.as_str(), true), true)));
        },
        |_| {},
    );
    let (status, body) = post_request("/checkout/webhook", &completed_webhook_body("cs_hook"), configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Order processed successfully"));
}

#[actix_web::test]
async fn webhook_acks_unusable_metadata_to_stop_redelivery() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |store| {
            store.expect_fetch_order_by_session().returning(|_| Ok(None));
        },
        |_| {},
    );
    // Completed session, no placeholder, and metadata without cart or email: a poison pill
    let (status, body) = post_request("/checkout/webhook", &completed_webhook_body("cs_poison"), configure).await.unwrap();
    assert_eq!(status, StatusCode::OK, "poison pills must be acknowledged, not retried");
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], false);
}

#[actix_web::test]
async fn webhook_reports_transient_failures_as_retryable() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |store| {
            store
                .expect_fetch_order_by_session()
                .returning(|_| Err(SettlementError::DatabaseError("connection lost".to_string())));
        },
        |_| {},
    );
    let (status, _) = post_request("/checkout/webhook", &completed_webhook_body("cs_down"), configure).await.unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn manual_fallback_refuses_an_unpaid_session() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |_| {},
        |gateway| {
            gateway.expect_retrieve_session().returning(|id| {
                Ok(SessionData {
                    id: id.clone(),
                    payment_complete: false,
                    payment_intent_id: None,
                    customer_email: None,
                    metadata: Default::default(),
                })
            });
        },
    );
    let (status, body) =
        post_request("/checkout/order", &json!({"session_id": "cs_unpaid"}), configure).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not completed"));
}

#[actix_web::test]
async fn poll_path_reports_an_unpaid_session_without_settling() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |store| {
            store
                .expect_fetch_order_by_session()
                .times(1)
                .returning(|id| Ok(Some(sample_order(9, id.as_str(), false))));
        },
        |gateway| {
            gateway.expect_retrieve_session().returning(|id| {
                Ok(SessionData {
                    id: id.clone(),
                    payment_complete: false,
                    payment_intent_id: None,
                    customer_email: Some("diner@example.com".to_string()),
                    metadata: Default::default(),
                })
            });
        },
    );
    let (status, body) =
        post_request("/checkout/session/details", &json!({"session_id": "cs_poll"}), configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["payment_status"], "unpaid");
    assert_eq!(json["order"]["id"], 9);
    assert_eq!(json["order"]["is_paid"], false);
}

#[actix_web::test]
async fn order_lookup_misses_are_not_found() {
    let _ = env_logger::try_init().ok();
    let configure = configure_with(
        |store| {
            store.expect_fetch_order().returning(|_| Ok(None));
        },
        |_| {},
    );
    let (status, _) = super::helpers::get_request("/orders/404", configure).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn customer_order_history_is_served() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_customer().returning(|id| Ok(Some(super::helpers::sample_customer(id))));
    store
        .expect_fetch_orders_for_customer()
        .returning(|_| Ok(vec![sample_order(1, "cs_hist", true)]));
    let configure = move |cfg: &mut ServiceConfig| {
        let api = forkful_engine::CustomerApi::new(store);
        cfg.service(crate::routes::CustomerOrdersRoute::<MockOrderStore>::new()).app_data(web::Data::new(api));
    };
    let (status, body) = super::helpers::get_request("/customers/8/orders", configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["is_paid"], true);
}

#[actix_web::test]
async fn unknown_customer_history_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_customer().returning(|_| Ok(None));
    let configure = move |cfg: &mut ServiceConfig| {
        let api = forkful_engine::CustomerApi::new(store);
        cfg.service(crate::routes::CustomerOrdersRoute::<MockOrderStore>::new()).app_data(web::Data::new(api));
    };
    let (status, _) = super::helpers::get_request("/customers/8/orders", configure).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//----------------------------------------------   HMAC  ----------------------------------------------------
fn configure_signed(store_setup: impl FnOnce(&mut MockOrderStore)) -> impl FnOnce(&mut ServiceConfig) {
    let mut store = MockOrderStore::new();
    store_setup(&mut store);
    let gateway = MockGateway::new();
    move |cfg: &mut ServiceConfig| {
        let api = SettlementApi::new(store, gateway, PricingPolicy::default(), EventProducers::default());
        let webhook_scope = web::scope("/checkout/webhook")
            .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, Secret::new(WEBHOOK_SECRET.to_string()), true))
            .service(CheckoutWebhookRoute::<MockOrderStore, MockGateway>::new());
        cfg.service(webhook_scope).app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn unsigned_webhook_deliveries_are_refused() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure_signed(|_| {}))).await;
    let req = test::TestRequest::post()
        .uri("/checkout/webhook")
        .set_json(completed_webhook_body("cs_unsigned"))
        .to_request();
    let err = test::try_call_service(&app, req).await.expect_err("expected a rejection");
    assert!(err.to_string().contains("signature"));
}

#[actix_web::test]
async fn tampered_webhook_deliveries_are_refused() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure_signed(|_| {}))).await;
    let payload = completed_webhook_body("cs_tampered").to_string();
    let req = test::TestRequest::post()
        .uri("/checkout/webhook")
        .insert_header((SIGNATURE_HEADER, calculate_hmac("wrong-secret", payload.as_bytes())))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload)
        .to_request();
    let err = test::try_call_service(&app, req).await.expect_err("expected a rejection");
    assert!(err.to_string().contains("Invalid"));
}

#[actix_web::test]
async fn correctly_signed_webhook_deliveries_pass_verification() {
    let _ = env_logger::try_init().ok();
    let configure = configure_signed(|store| {
        store
            .expect_fetch_order_by_session()
            .returning(|id| Ok(Some(sample_order(3, id.as_str(), true))));
    });
    let app = test::init_service(App::new().configure(configure)).await;
    let payload = completed_webhook_body("cs_signed").to_string();
    let req = test::TestRequest::post()
        .uri("/checkout/webhook")
        .insert_header((SIGNATURE_HEADER, calculate_hmac(WEBHOOK_SECRET, payload.as_bytes())))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload)
        .to_request();
    let res = test::try_call_service(&app, req).await.expect("signed request should pass");
    assert_eq!(res.status(), StatusCode::OK);
}
