use crate::{
    db_types::{Customer, Order},
    traits::{CustomerApiError, CustomerManagement},
};

/// Thin read surface over customer records for the order-history endpoints. Cart mutation stays with the
/// cart-management surface; settlement clears carts through its own store handle.
pub struct CustomerApi<B> {
    db: B,
}

impl<B> CustomerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CustomerApi<B>
where B: CustomerManagement
{
    pub async fn customer(&self, customer_id: i64) -> Result<Customer, CustomerApiError> {
        self.db.fetch_customer(customer_id).await?.ok_or(CustomerApiError::CustomerNotFound(customer_id))
    }

    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, CustomerApiError> {
        self.db.fetch_orders_for_customer(customer_id).await
    }
}
