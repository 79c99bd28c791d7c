use chrono::Duration;
use thiserror::Error;

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderStatus, PaymentUpdate, SessionId},
    traits::{CustomerApiError, CustomerManagement},
};

/// The order-settlement contract a storage backend must satisfy.
///
/// Settlement runs request-parallel with no in-process locking; correctness rests entirely on two properties this
/// trait demands of the store:
///
/// 1. **Unique-session arbitration.** At most one order row can exist per session id (and per payment intent id).
///    A second concurrent insert for the same session must fail with [`SettlementError::DuplicateSession`] so the
///    caller can fall back to reading and updating the winning row.
/// 2. **Exactly-once paid transition.** [`mark_order_paid`](Self::mark_order_paid) must perform the pending→paid
///    update as a single guarded write, reporting whether *this* call performed the transition. Side effects that
///    must run once per order (cart clearing, paid events) key off that report.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + CustomerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts a pending placeholder order for a freshly opened session. Idempotent: if an order already exists for
    /// the session the existing row is returned untouched and the second tuple element is `false`.
    async fn insert_pending_order(&self, order: NewOrder) -> Result<(Order, bool), SettlementError>;

    /// Inserts a fully settled order in one shot. Fails with [`SettlementError::DuplicateSession`] when another
    /// order for the same session already exists; callers treat that as losing the race, not as a failure.
    async fn insert_paid_order(&self, order: NewOrder) -> Result<Order, SettlementError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError>;

    async fn fetch_order_by_session(&self, session_id: &SessionId) -> Result<Option<Order>, SettlementError>;

    /// Transitions the order for `session_id` to paid/completed, stamping `paid_at` and back-filling the payment
    /// reference, owner and email where they are still unset. The update is guarded on `is_paid = 0`: the returned
    /// flag is `true` only for the single call that actually performed the transition.
    async fn mark_order_paid(
        &self,
        session_id: &SessionId,
        update: PaymentUpdate,
    ) -> Result<(Order, bool), SettlementError>;

    /// Owner/admin lifecycle edit (cancel, ship, complete). Identity fields are untouched.
    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, SettlementError>;

    /// Fetches orders according to the criteria in the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, SettlementError>;

    /// Cancels placeholder orders that have sat unpaid for longer than `older_than`. Returns the orders that were
    /// cancelled by this sweep.
    async fn cancel_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("An order already exists for session {0}")]
    DuplicateSession(SessionId),
    #[error("An order already exists for payment intent {0}")]
    DuplicatePaymentIntent(String),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("No order exists for session {0}")]
    OrderNotFoundForSession(SessionId),
    #[error("{0}")]
    CustomerError(#[from] CustomerApiError),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}
