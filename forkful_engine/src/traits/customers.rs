use thiserror::Error;

use crate::db_types::{Cart, Customer, Order, OrderItem};

/// Customer and cart operations the settlement flow relies on.
///
/// A note on the cart: the cart document is shared between the cart-management surface and the settlement flow,
/// which empties it exactly once when an order transitions to paid. No lock coordinates the two writers, so an item
/// the customer adds in the instant between payment completion and the clear survives the clear. That lost update is
/// benign and accepted; callers must not try to close it with locking.
#[allow(async_fn_in_trait)]
pub trait CustomerManagement: Clone {
    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError>;

    /// Looks a customer up by contact email. Settlement uses this to resolve order ownership when the session
    /// metadata carries no customer id.
    async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError>;

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, CustomerApiError>;

    async fn fetch_cart(&self, customer_id: i64) -> Result<Option<Cart>, CustomerApiError>;

    /// Replaces the customer's cart contents, creating the cart document if it does not exist.
    async fn upsert_cart(&self, customer_id: i64, items: Vec<OrderItem>) -> Result<Cart, CustomerApiError>;

    /// Empties the customer's cart. Returns `true` if a cart document existed. Callers guard this on the paid
    /// transition so it runs at most once per order.
    async fn clear_cart(&self, customer_id: i64) -> Result<bool, CustomerApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested customer {0} does not exist")]
    CustomerNotFound(i64),
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        CustomerApiError::DatabaseError(e.to_string())
    }
}
