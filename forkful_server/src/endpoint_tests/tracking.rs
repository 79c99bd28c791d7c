use actix_web::{http::StatusCode, web, web::ServiceConfig};
use forkful_engine::{
    db_types::{DeliveryStatus, RestaurantOrigin},
    events::EventProducers,
    traits::TrackingError,
    RiderMatcherApi,
    TrackingApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, put_request, sample_tracking},
    mocks::MockTrackingStore,
};
use crate::routes::{
    NearbyOrdersRoute,
    TrackingForOrderRoute,
    UpdateRiderLocationRoute,
    UpdateTrackingStatusRoute,
};

fn with_store<F>(setup: F) -> impl FnOnce(&mut ServiceConfig)
where F: FnOnce(&mut MockTrackingStore) {
    let mut store = MockTrackingStore::new();
    setup(&mut store);
    move |cfg: &mut ServiceConfig| {
        let api = TrackingApi::new(store, RestaurantOrigin::default(), EventProducers::default());
        cfg.service(TrackingForOrderRoute::<MockTrackingStore>::new())
            .service(UpdateTrackingStatusRoute::<MockTrackingStore>::new())
            .service(UpdateRiderLocationRoute::<MockTrackingStore>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn tracking_snapshot_carries_derived_fields() {
    let _ = env_logger::try_init().ok();
    let configure = with_store(|store| {
        store
            .expect_fetch_tracking_for_order()
            .returning(|order_id| Ok(Some(sample_tracking(order_id, DeliveryStatus::OutForDelivery))));
    });
    let (status, body) = get_request("/tracking/order/7", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["order_id"], 7);
    assert_eq!(json["data"]["progress_percentage"], 75);
    assert!(json["data"]["time_remaining_secs"].as_i64().unwrap() > 0);
}

#[actix_web::test]
async fn missing_tracking_is_not_found() {
    let _ = env_logger::try_init().ok();
    let configure = with_store(|store| {
        store.expect_fetch_tracking_for_order().returning(|_| Ok(None));
    });
    let (status, body) = get_request("/tracking/order/99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("tracking for order 99"));
}

#[actix_web::test]
async fn terminal_transition_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let configure = with_store(|store| {
        store
            .expect_update_tracking_status()
            .returning(|order_id, _, _, _| Err(TrackingError::TerminalState { order_id, status: DeliveryStatus::Delivered }));
    });
    let (status, body) =
        put_request("/tracking/status/7", &json!({"status": "preparing"}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already Delivered"));
}

#[actix_web::test]
async fn bundled_rider_assignment_runs_before_the_status_update() {
    let _ = env_logger::try_init().ok();
    let configure = with_store(|store| {
        store.expect_assign_rider().times(1).returning(|order_id, rider| {
            let mut t = sample_tracking(order_id, DeliveryStatus::ReadyForPickup);
            t.rider_id = Some(rider.rider_id);
            t.rider_info = rider.info();
            Ok(t)
        });
        store.expect_update_tracking_status().times(1).returning(|order_id, status, _, _| {
            let mut t = sample_tracking(order_id, status);
            t.rider_id = Some(7);
            Ok(t)
        });
    });
    let body = json!({
        "status": "out_for_delivery",
        "rider": {"rider_id": 7, "name": "Ravi", "vehicle_type": "scooter"}
    });
    let (status, body) = put_request("/tracking/status/3", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["status"], "out_for_delivery");
    assert_eq!(json["data"]["progress_percentage"], 75);
}

#[actix_web::test]
async fn location_update_without_rider_is_rejected() {
    let _ = env_logger::try_init().ok();
    let configure = with_store(|store| {
        store.expect_update_rider_location().returning(|order_id, _| Err(TrackingError::NoRiderAssigned(order_id)));
    });
    let body = json!({"location": {"lng": 77.22, "lat": 28.62}, "heading": 45.0, "speed": 20.0});
    let (status, body) = put_request("/tracking/location/7", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("no rider assigned"));
}

fn with_matcher<F>(setup: F) -> impl FnOnce(&mut ServiceConfig)
where F: FnOnce(&mut MockTrackingStore) {
    let mut store = MockTrackingStore::new();
    setup(&mut store);
    move |cfg: &mut ServiceConfig| {
        let matcher = RiderMatcherApi::new(store);
        cfg.service(NearbyOrdersRoute::<MockTrackingStore>::new()).app_data(web::Data::new(matcher));
    }
}

#[actix_web::test]
async fn nearby_lists_candidates_with_distances() {
    let _ = env_logger::try_init().ok();
    let configure = with_matcher(|store| {
        store.expect_fetch_trackings_near().returning(|_, _| {
            Ok(vec![
                (sample_tracking(1, DeliveryStatus::ReadyForPickup), 100.0),
                (sample_tracking(2, DeliveryStatus::OutForDelivery), 3_000.0),
            ])
        });
    });
    let (status, body) =
        get_request("/tracking/nearby?lng=77.2090&lat=28.6139", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let matches = json.as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["distance_m"], 100.0);
    assert_eq!(matches[0]["tracking"]["order_id"], 1);
}

#[actix_web::test]
async fn nearby_rejects_a_nonpositive_radius() {
    let _ = env_logger::try_init().ok();
    let configure = with_matcher(|_| {});
    let (status, _) = get_request("/tracking/nearby?lng=77.2&lat=28.6&max_distance=-5", configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
