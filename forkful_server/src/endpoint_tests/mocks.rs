use chrono::Duration;
use forkful_engine::{
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
    traits::{
        CustomerApiError,
        CustomerManagement,
        NewSessionRequest,
        PaymentSessionSource,
        SessionData,
        SessionHandle,
        SessionSourceError,
        SettlementDatabase,
        SettlementError,
        TrackingDatabase,
        TrackingError,
    },
};
use mockall::mock;

mock! {
    pub OrderStore {}

    impl Clone for OrderStore {
        fn clone(&self) -> Self;
    }

    impl CustomerManagement for OrderStore {
        async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError>;
        async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError>;
        async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, CustomerApiError>;
        async fn fetch_cart(&self, customer_id: i64) -> Result<Option<Cart>, CustomerApiError>;
        async fn upsert_cart(&self, customer_id: i64, items: Vec<OrderItem>) -> Result<Cart, CustomerApiError>;
        async fn clear_cart(&self, customer_id: i64) -> Result<bool, CustomerApiError>;
    }

    impl SettlementDatabase for OrderStore {
        fn url(&self) -> &str;
        async fn insert_pending_order(&self, order: NewOrder) -> Result<(Order, bool), SettlementError>;
        async fn insert_paid_order(&self, order: NewOrder) -> Result<Order, SettlementError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError>;
        async fn fetch_order_by_session(&self, session_id: &SessionId) -> Result<Option<Order>, SettlementError>;
        async fn mark_order_paid(
            &self,
            session_id: &SessionId,
            update: PaymentUpdate,
        ) -> Result<(Order, bool), SettlementError>;
        async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, SettlementError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, SettlementError>;
        async fn cancel_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, SettlementError>;
    }
}

mock! {
    pub TrackingStore {}

    impl Clone for TrackingStore {
        fn clone(&self) -> Self;
    }

    impl TrackingDatabase for TrackingStore {
        async fn create_tracking(
            &self,
            tracking: NewTracking,
            origin: &RestaurantOrigin,
        ) -> Result<Tracking, TrackingError>;
        async fn fetch_tracking_for_order(&self, order_id: i64) -> Result<Option<Tracking>, TrackingError>;
        async fn update_tracking_status(
            &self,
            order_id: i64,
            status: DeliveryStatus,
            location: Option<GeoPoint>,
            message: Option<String>,
        ) -> Result<Tracking, TrackingError>;
        async fn assign_rider(&self, order_id: i64, rider: RiderDescriptor) -> Result<Tracking, TrackingError>;
        async fn update_rider_location(&self, order_id: i64, location: GeoPoint) -> Result<Tracking, TrackingError>;
        async fn fetch_history_for_order(&self, order_id: i64) -> Result<Vec<TrackingEntry>, TrackingError>;
        async fn fetch_active_trackings_for_customer(&self, customer_id: i64) -> Result<Vec<Tracking>, TrackingError>;
        async fn fetch_trackings_near(
            &self,
            point: GeoPoint,
            max_distance_m: f64,
        ) -> Result<Vec<(Tracking, f64)>, TrackingError>;
    }
}

mock! {
    pub Gateway {}

    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }

    impl PaymentSessionSource for Gateway {
        async fn create_session(&self, request: NewSessionRequest) -> Result<SessionHandle, SessionSourceError>;
        async fn retrieve_session(&self, session_id: &SessionId) -> Result<SessionData, SessionSourceError>;
    }
}
