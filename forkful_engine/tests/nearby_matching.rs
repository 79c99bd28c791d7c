//! Geospatial rider-matching tests: eligibility filtering, radius cut-off and nearest-first ordering.
use chrono::{Duration, Utc};
use fdg_common::Paise;
use forkful_engine::{
    db_types::{
        DeliveryStatus,
        GeoPoint,
        NewOrder,
        NewTracking,
        OrderItem,
        OrderStatus,
        PaymentStatus,
        RestaurantOrigin,
        SessionId,
        ShippingAddress,
    },
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::SettlementDatabase,
    RiderMatcherApi,
    SqliteDatabase,
    TrackingApi,
};

// One degree of latitude is ~111.19 km on the spherical model, so these offsets put trackings at known distances
// due north of the query point.
const DEG_PER_METER_LAT: f64 = 1.0 / 111_194.93;

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn seed_order(db: &SqliteDatabase, tag: &str) -> i64 {
    let order = NewOrder {
        session_id: Some(SessionId::from(format!("cs_nearby_{tag}"))),
        payment_intent_id: None,
        customer_id: None,
        items: vec![OrderItem {
            product_id: None,
            name: "Biryani".to_string(),
            quantity: 1,
            unit_price: Paise::from_rupees(250),
            image_url: None,
        }],
        shipping_address: ShippingAddress::default(),
        payment_method: "Credit Card".to_string(),
        items_price: Paise::from_rupees(250),
        tax_price: Paise::from(1_250),
        shipping_price: Paise::default(),
        discount: Paise::default(),
        total_price: Paise::from(26_250),
        email: None,
        is_paid: false,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        promo_code: None,
    }
    .paid(Some(format!("pi_nearby_{tag}")));
    db.insert_paid_order(order).await.expect("could not seed order").id
}

/// Creates a tracking, moves it to `status`, and parks its current location `meters` due north of `base`.
async fn tracking_at(
    api: &TrackingApi<SqliteDatabase>,
    db: &SqliteDatabase,
    base: GeoPoint,
    meters: f64,
    status: DeliveryStatus,
    tag: &str,
) -> i64 {
    let order_id = seed_order(db, tag).await;
    let new = NewTracking {
        order_id,
        customer_id: 1,
        destination: GeoPoint::new(base.lng, base.lat + 0.1),
        destination_address: "somewhere north".to_string(),
        eta: Utc::now() + Duration::minutes(30),
    };
    api.create(new).await.unwrap();
    let location = GeoPoint::new(base.lng, base.lat + meters * DEG_PER_METER_LAT);
    api.update_status(order_id, status, Some(location), None).await.unwrap();
    order_id
}

#[tokio::test]
async fn nearby_returns_eligible_trackings_nearest_first() {
    let db = new_db().await;
    let api = TrackingApi::new(db.clone(), RestaurantOrigin::default(), EventProducers::default());
    let matcher = RiderMatcherApi::new(db.clone());
    let base = GeoPoint::new(77.2090, 28.6139);

    let near_id = tracking_at(&api, &db, base, 100.0, DeliveryStatus::ReadyForPickup, "near").await;
    let mid_id = tracking_at(&api, &db, base, 3_000.0, DeliveryStatus::ReadyForPickup, "mid").await;
    // In range but not eligible for pickup
    tracking_at(&api, &db, base, 1_000.0, DeliveryStatus::Preparing, "ineligible").await;
    // Eligible but outside the radius
    tracking_at(&api, &db, base, 6_000.0, DeliveryStatus::ReadyForPickup, "far").await;

    let matches = matcher.find_nearby(base, 5_000.0).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].tracking.order_id, near_id);
    assert_eq!(matches[1].tracking.order_id, mid_id);
    assert!((matches[0].distance_m - 100.0).abs() < 5.0, "got {}", matches[0].distance_m);
    assert!((matches[1].distance_m - 3_000.0).abs() < 10.0, "got {}", matches[1].distance_m);
}

#[tokio::test]
async fn out_for_delivery_is_also_eligible() {
    let db = new_db().await;
    let api = TrackingApi::new(db.clone(), RestaurantOrigin::default(), EventProducers::default());
    let matcher = RiderMatcherApi::new(db.clone());
    let base = GeoPoint::new(77.2090, 28.6139);

    let id = tracking_at(&api, &db, base, 500.0, DeliveryStatus::OutForDelivery, "ofd").await;
    let matches = matcher.find_nearby(base, 5_000.0).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].tracking.order_id, id);
}

#[tokio::test]
async fn no_candidates_is_an_empty_list() {
    let db = new_db().await;
    let matcher = RiderMatcherApi::new(db);
    let matches = matcher.find_nearby(GeoPoint::new(72.8777, 19.0760), 5_000.0).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn delivered_trackings_never_match() {
    let db = new_db().await;
    let api = TrackingApi::new(db.clone(), RestaurantOrigin::default(), EventProducers::default());
    let matcher = RiderMatcherApi::new(db.clone());
    let base = GeoPoint::new(77.2090, 28.6139);

    let order_id = tracking_at(&api, &db, base, 200.0, DeliveryStatus::OutForDelivery, "done").await;
    api.update_status(order_id, DeliveryStatus::Delivered, None, None).await.unwrap();
    let matches = matcher.find_nearby(base, 5_000.0).await.unwrap();
    assert!(matches.is_empty());
}
