use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{
        Cart,
        Customer,
        DeliveryStatus,
        GeoPoint,
        NewOrder,
        NewTracking,
        Order,
        OrderItem,
        OrderStatus,
        PaymentUpdate,
        RestaurantOrigin,
        RiderDescriptor,
        SessionId,
        Tracking,
        TrackingEntry,
    },
    sqlite::db::{customers, orders, tracking},
    traits::{CustomerApiError, CustomerManagement, SettlementDatabase, SettlementError, TrackingDatabase, TrackingError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
        debug!("🗃️ Connected to database at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await.map_err(|e| sqlx::Error::Migrate(Box::new(e)))
    }

    /// Backend-specific helper, mainly for seeding: customer records are otherwise owned by the account surface.
    pub async fn create_customer(
        &self,
        username: &str,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        Ok(customers::insert_customer(username, email, phone, &mut conn).await?)
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        Ok(customers::fetch_customer(customer_id, &mut conn).await?)
    }

    async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        Ok(customers::fetch_customer_by_email(email, &mut conn).await?)
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        Ok(customers::fetch_orders_for_customer(customer_id, &mut conn).await?)
    }

    async fn fetch_cart(&self, customer_id: i64) -> Result<Option<Cart>, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        Ok(customers::fetch_cart(customer_id, &mut conn).await?)
    }

    async fn upsert_cart(&self, customer_id: i64, items: Vec<OrderItem>) -> Result<Cart, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        customers::upsert_cart(customer_id, items, &mut conn).await
    }

    async fn clear_cart(&self, customer_id: i64) -> Result<bool, CustomerApiError> {
        let mut conn = self.pool.acquire().await.map_err(CustomerApiError::from)?;
        customers::clear_cart(customer_id, &mut conn).await
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_pending_order(&self, order: NewOrder) -> Result<(Order, bool), SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        orders::insert_pending(order, &mut conn).await
    }

    async fn insert_paid_order(&self, order: NewOrder) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        orders::insert_paid(order, &mut conn).await
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        Ok(orders::fetch_by_id(order_id, &mut conn).await?)
    }

    async fn fetch_order_by_session(&self, session_id: &SessionId) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        Ok(orders::fetch_by_session(session_id, &mut conn).await?)
    }

    async fn mark_order_paid(
        &self,
        session_id: &SessionId,
        update: PaymentUpdate,
    ) -> Result<(Order, bool), SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        orders::mark_paid(session_id, update, &mut conn).await
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        orders::update_status(order_id, status, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        Ok(orders::search(query, &mut conn).await?)
    }

    async fn cancel_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await.map_err(SettlementError::from)?;
        orders::cancel_stale_pending(older_than, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}

impl TrackingDatabase for SqliteDatabase {
    async fn create_tracking(
        &self,
        new_tracking: NewTracking,
        origin: &RestaurantOrigin,
    ) -> Result<Tracking, TrackingError> {
        let mut tx = self.pool.begin().await.map_err(TrackingError::from)?;
        let result = tracking::create(new_tracking, origin, &mut tx).await?;
        tx.commit().await.map_err(TrackingError::from)?;
        Ok(result)
    }

    async fn fetch_tracking_for_order(&self, order_id: i64) -> Result<Option<Tracking>, TrackingError> {
        let mut conn = self.pool.acquire().await.map_err(TrackingError::from)?;
        Ok(tracking::fetch_by_order(order_id, &mut conn).await?)
    }

    async fn update_tracking_status(
        &self,
        order_id: i64,
        status: DeliveryStatus,
        location: Option<GeoPoint>,
        message: Option<String>,
    ) -> Result<Tracking, TrackingError> {
        let mut tx = self.pool.begin().await.map_err(TrackingError::from)?;
        let result = tracking::update_status(order_id, status, location, message, &mut tx).await?;
        tx.commit().await.map_err(TrackingError::from)?;
        Ok(result)
    }

    async fn assign_rider(&self, order_id: i64, rider: RiderDescriptor) -> Result<Tracking, TrackingError> {
        let mut conn = self.pool.acquire().await.map_err(TrackingError::from)?;
        tracking::assign_rider(order_id, rider, &mut conn).await
    }

    async fn update_rider_location(&self, order_id: i64, location: GeoPoint) -> Result<Tracking, TrackingError> {
        let mut conn = self.pool.acquire().await.map_err(TrackingError::from)?;
        tracking::update_location(order_id, location, &mut conn).await
    }

    async fn fetch_history_for_order(&self, order_id: i64) -> Result<Vec<TrackingEntry>, TrackingError> {
        let mut conn = self.pool.acquire().await.map_err(TrackingError::from)?;
        Ok(tracking::history_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_active_trackings_for_customer(&self, customer_id: i64) -> Result<Vec<Tracking>, TrackingError> {
        let mut conn = self.pool.acquire().await.map_err(TrackingError::from)?;
        Ok(tracking::active_for_customer(customer_id, &mut conn).await?)
    }

    async fn fetch_trackings_near(
        &self,
        point: GeoPoint,
        max_distance_m: f64,
    ) -> Result<Vec<(Tracking, f64)>, TrackingError> {
        let mut conn = self.pool.acquire().await.map_err(TrackingError::from)?;
        Ok(tracking::near(point, max_distance_m, &mut conn).await?)
    }
}
