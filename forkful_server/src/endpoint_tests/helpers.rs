use actix_web::{http::StatusCode, test, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use fdg_common::Paise;
use forkful_engine::db_types::{
    Customer,
    DeliveryStatus,
    GeoPoint,
    Order,
    OrderItem,
    OrderStatus,
    PaymentStatus,
    RiderInfo,
    SessionId,
    ShippingAddress,
    Tracking,
};
use serde::Serialize;
use sqlx::types::Json;

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::get().uri(path).to_request();
    match test::try_call_service(&app, req).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            Ok((status, String::from_utf8_lossy(&body).to_string()))
        },
        Err(e) => Err(e.to_string()),
    }
}

pub async fn post_request<F, B>(path: &str, body: &B, configure: F) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
    B: Serialize,
{
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::post().uri(path).set_json(body).to_request();
    match test::try_call_service(&app, req).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            Ok((status, String::from_utf8_lossy(&body).to_string()))
        },
        Err(e) => Err(e.to_string()),
    }
}

pub async fn put_request<F, B>(path: &str, body: &B, configure: F) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
    B: Serialize,
{
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::put().uri(path).set_json(body).to_request();
    match test::try_call_service(&app, req).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            Ok((status, String::from_utf8_lossy(&body).to_string()))
        },
        Err(e) => Err(e.to_string()),
    }
}

pub fn sample_item() -> OrderItem {
    OrderItem {
        product_id: Some(12),
        name: "Paneer Tikka".to_string(),
        quantity: 2,
        unit_price: Paise::from_rupees(200),
        image_url: None,
    }
}

pub fn sample_order(id: i64, session: &str, paid: bool) -> Order {
    let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Order {
        id,
        session_id: Some(SessionId::from(session)),
        payment_intent_id: paid.then(|| "pi_sample".to_string()),
        customer_id: None,
        items: Json(vec![sample_item()]),
        shipping_address: Json(ShippingAddress {
            address: "42 Lodhi Road".into(),
            city: "New Delhi".into(),
            postal_code: "110003".into(),
            country: "India".into(),
            ..Default::default()
        }),
        payment_method: "Credit Card".to_string(),
        items_price: Paise::from_rupees(400),
        tax_price: Paise::from_rupees(20),
        shipping_price: Paise::from_rupees(50),
        discount: Paise::default(),
        total_price: Paise::from_rupees(470),
        email: Some("diner@example.com".to_string()),
        is_paid: paid,
        paid_at: paid.then_some(created),
        status: if paid { OrderStatus::Completed } else { OrderStatus::Pending },
        payment_status: if paid { PaymentStatus::Paid } else { PaymentStatus::Pending },
        promo_code: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn sample_customer(id: i64) -> Customer {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    Customer {
        id,
        username: "asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: Some("+91-98000-00000".to_string()),
        created_at: created,
        updated_at: created,
    }
}

pub fn sample_tracking(order_id: i64, status: DeliveryStatus) -> Tracking {
    let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Tracking {
        id: order_id * 10,
        order_id,
        customer_id: 42,
        rider_id: None,
        rider_info: RiderInfo::default(),
        status,
        current_location: GeoPoint::new(77.2090, 28.6139),
        destination: GeoPoint::new(77.2310, 28.6129),
        destination_address: "42 Lodhi Road, New Delhi".to_string(),
        origin: GeoPoint::new(77.2090, 28.6139),
        origin_address: "Forkful Restaurant, Delhi".to_string(),
        eta: Utc::now() + Duration::minutes(25),
        delivered_at: None,
        is_active: true,
        created_at: created,
        updated_at: created,
    }
}
