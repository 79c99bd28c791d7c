use std::fmt::Debug;

use chrono::Duration;
use fdg_common::Paise;
use log::*;

use crate::{
    api::{
        errors::SettlementApiError,
        order_objects::{OpenSessionRequest, OrderMetadata, OrderQueryFilter, PricingPolicy},
    },
    db_types::{NewOrder, Order, OrderStatus, PaymentStatus, PaymentUpdate, SessionId},
    events::{EventProducers, OrderPaidEvent},
    traits::{NewSessionRequest, PaymentSessionSource, SessionData, SessionHandle, SettlementDatabase, SettlementError},
};

/// `SettlementApi` is the order materializer: the single place where payment sessions become durable orders.
///
/// It is reachable from three independent call sites which may race — the gateway webhook, the client's
/// post-redirect poll, and the manual reconciliation fallback. All three funnel into [`Self::settle_session`], and
/// the store's unique session constraint is the final arbiter: whichever call wins the insert (or the guarded paid
/// update) performs the once-per-order side effects; every other call reads the winner back and returns it.
pub struct SettlementApi<B, S> {
    db: B,
    gateway: S,
    pricing: PricingPolicy,
    producers: EventProducers,
}

impl<B, S> Debug for SettlementApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, S> SettlementApi<B, S> {
    pub fn new(db: B, gateway: S, pricing: PricingPolicy, producers: EventProducers) -> Self {
        Self { db, gateway, pricing, producers }
    }
}

impl<B, S> SettlementApi<B, S>
where
    B: SettlementDatabase,
    S: PaymentSessionSource,
{
    /// Opens a checkout session for the given cart.
    ///
    /// Validation happens before anything else touches the store or the gateway. Totals are re-derived from the
    /// line items using the injected [`PricingPolicy`]; nothing the client claims about money is trusted. Once the
    /// gateway hands back a session, a pending placeholder order is recorded for it so the order is visible to the
    /// customer before payment completes. The placeholder insert is idempotent and its failure is deliberately
    /// non-fatal: bookkeeping must never block the payment flow.
    pub async fn open_session(&self, request: OpenSessionRequest) -> Result<SessionHandle, SettlementApiError> {
        let email = request
            .customer_email
            .clone()
            .or_else(|| request.shipping.email.clone())
            .ok_or_else(|| SettlementApiError::ValidationError("Customer email is required".to_string()))?;
        if request.cart_items.is_empty() {
            return Err(SettlementApiError::ValidationError("Cart is empty".to_string()));
        }
        for item in &request.cart_items {
            if item.name.is_empty() || item.unit_price.value() <= 0 || item.quantity == 0 {
                return Err(SettlementApiError::ValidationError(format!(
                    "Invalid cart item: missing name, price, or quantity ({item:?})"
                )));
            }
        }
        let subtotal: Paise = request.cart_items.iter().map(|i| i.line_total()).sum();
        let quote = self.pricing.quote(subtotal);
        debug!(
            "💳️ Opening session for {email}: {} items, subtotal {subtotal}, tax {}, delivery {}",
            request.cart_items.len(),
            quote.tax,
            quote.delivery_charge
        );
        let metadata = OrderMetadata {
            cart_items: request.cart_items.clone(),
            shipping: request.shipping.clone(),
            subtotal: quote.subtotal,
            tax: quote.tax,
            delivery_charge: quote.delivery_charge,
            total: quote.total,
            customer_email: email.clone(),
            customer_id: request.customer_id,
        };
        let session_request = NewSessionRequest {
            line_items: request.cart_items.clone(),
            customer_email: email.clone(),
            metadata: metadata.to_map(),
        };
        let handle = self.gateway.create_session(session_request).await?;
        info!("💳️ Checkout session {} opened, total {}", handle.session_id, quote.total);

        let placeholder = NewOrder::placeholder(handle.session_id.clone(), request.cart_items, request.shipping)
            .with_totals(quote.subtotal, quote.tax, quote.delivery_charge)
            .with_email(email)
            .with_customer(request.customer_id);
        match self.db.insert_pending_order(placeholder).await {
            Ok((order, true)) => debug!("💳️ Pending order #{} recorded for session {}", order.id, handle.session_id),
            Ok((_, false)) => debug!("💳️ Session {} already has an order, placeholder skipped", handle.session_id),
            Err(e) => warn!("💳️ Could not record a pending order for session {}: {e}", handle.session_id),
        }
        Ok(handle)
    }

    /// Fetches the session from the gateway and settles it. This is the poll and manual-fallback entry point; the
    /// webhook path already holds the session payload and calls [`Self::settle_session`] directly.
    pub async fn materialize(&self, session_id: &SessionId) -> Result<Order, SettlementApiError> {
        let session = self.gateway.retrieve_session(session_id).await?;
        self.settle_session(&session).await
    }

    /// The session's current state, straight from the gateway. Read-only; nothing is settled.
    pub async fn fetch_session(&self, session_id: &SessionId) -> Result<SessionData, SettlementApiError> {
        Ok(self.gateway.retrieve_session(session_id).await?)
    }

    /// Settles a session into exactly one paid order, no matter how many times or from how many threads it is
    /// called.
    ///
    /// * Session not paid → [`SettlementApiError::PaymentIncomplete`]; a paid order is never conjured from an
    ///   incomplete session.
    /// * An order already exists and is paid → returned unchanged.
    /// * A pending placeholder exists → it transitions to paid via a single guarded update; side effects run only
    ///   on the call that performed the transition.
    /// * No order exists → one is built from the session's correlation metadata and inserted as paid. A concurrent
    ///   winner surfaces as a duplicate-session conflict, which is converted into the read-back path.
    pub async fn settle_session(&self, session: &SessionData) -> Result<Order, SettlementApiError> {
        if !session.payment_complete {
            debug!("💳️ Session {} is not paid yet; refusing to settle", session.id);
            return Err(SettlementApiError::PaymentIncomplete(session.id.clone()));
        }
        if let Some(existing) = self.db.fetch_order_by_session(&session.id).await.map_err(SettlementApiError::from)? {
            if existing.is_paid {
                trace!("💳️ Order #{} for session {} is already settled", existing.id, session.id);
                return Ok(existing);
            }
            return self.pay_existing_order(session).await;
        }

        let meta = OrderMetadata::parse(&session.metadata).map_err(SettlementApiError::DataIntegrity)?;
        let email = session.customer_email.clone().unwrap_or_else(|| meta.customer_email.clone());
        let customer_id = self.resolve_customer(meta.customer_id, Some(&email)).await?;
        let order = NewOrder {
            session_id: Some(session.id.clone()),
            payment_intent_id: None,
            customer_id: None,
            items: meta.cart_items,
            shipping_address: meta.shipping,
            payment_method: "Credit Card".to_string(),
            items_price: meta.subtotal,
            tax_price: meta.tax,
            shipping_price: meta.delivery_charge,
            discount: Paise::default(),
            total_price: meta.total,
            email: Some(email),
            is_paid: false,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            promo_code: None,
        }
        .with_customer(customer_id)
        .paid(session.payment_intent_id.clone());

        match self.db.insert_paid_order(order).await {
            Ok(order) => {
                info!("💳️ Order #{} materialized directly from session {}", order.id, session.id);
                self.on_order_paid(&order).await;
                Ok(order)
            },
            Err(SettlementError::DuplicateSession(_)) | Err(SettlementError::DuplicatePaymentIntent(_)) => {
                debug!("💳️ Lost the materialization race for session {}; reading back the winner", session.id);
                self.pay_existing_order(session).await
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Transitions the existing order for this session to paid. Exactly one concurrent caller observes
    /// `transitioned == true` and runs the once-per-order side effects.
    async fn pay_existing_order(&self, session: &SessionData) -> Result<Order, SettlementApiError> {
        // Metadata may be unusable here (the placeholder already carries the cart); resolve what we can.
        let meta_customer = OrderMetadata::parse(&session.metadata).ok().and_then(|m| m.customer_id);
        let customer_id = self.resolve_customer(meta_customer, session.customer_email.as_deref()).await?;
        let update = PaymentUpdate {
            payment_intent_id: session.payment_intent_id.clone(),
            customer_id,
            email: session.customer_email.clone(),
        };
        let (order, transitioned) = self.db.mark_order_paid(&session.id, update).await?;
        if transitioned {
            info!("💳️ Order #{} settled from its pending placeholder for session {}", order.id, session.id);
            self.on_order_paid(&order).await;
        } else {
            trace!("💳️ Order #{} was already settled by a concurrent caller", order.id);
        }
        Ok(order)
    }

    /// Resolves the owning customer: the session-attached id wins, then lookup by contact email.
    async fn resolve_customer(
        &self,
        metadata_customer_id: Option<i64>,
        email: Option<&str>,
    ) -> Result<Option<i64>, SettlementApiError> {
        if metadata_customer_id.is_some() {
            return Ok(metadata_customer_id);
        }
        match email {
            Some(email) => {
                let customer = self.db.fetch_customer_by_email(email).await.map_err(SettlementApiError::from)?;
                Ok(customer.map(|c| c.id))
            },
            None => Ok(None),
        }
    }

    /// Once-per-order side effects: clear the owner's cart and notify subscribers. Cart failures are logged, not
    /// propagated — the order is already settled and must stay settled.
    async fn on_order_paid(&self, order: &Order) {
        if let Some(customer_id) = order.customer_id {
            match self.db.clear_cart(customer_id).await {
                Ok(true) => debug!("💳️ Cart cleared for customer #{customer_id}"),
                Ok(false) => trace!("💳️ Customer #{customer_id} had no cart to clear"),
                Err(e) => warn!("💳️ Could not clear the cart for customer #{customer_id}: {e}"),
            }
        }
        for producer in &self.producers.order_paid_producer {
            let event = OrderPaidEvent::new(order.clone());
            producer.publish_event(event).await;
        }
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, SettlementApiError> {
        self.db
            .fetch_order(order_id)
            .await?
            .ok_or(SettlementApiError::DatabaseError(SettlementError::OrderNotFound(order_id)))
    }

    pub async fn fetch_order_by_session(&self, session_id: &SessionId) -> Result<Option<Order>, SettlementApiError> {
        Ok(self.db.fetch_order_by_session(session_id).await?)
    }

    pub async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order, SettlementApiError> {
        let order = self.db.update_order_status(order_id, status).await?;
        info!("💳️ Order #{order_id} status set to {status}");
        Ok(order)
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, SettlementApiError> {
        Ok(self.db.search_orders(query).await?)
    }

    /// Cancels placeholder orders that have sat unpaid for longer than `older_than`. Called by the expiry worker.
    pub async fn expire_stale_orders(&self, older_than: Duration) -> Result<Vec<Order>, SettlementApiError> {
        let cancelled = self.db.cancel_stale_pending_orders(older_than).await?;
        if !cancelled.is_empty() {
            info!("💳️ {} stale pending orders cancelled", cancelled.len());
        }
        Ok(cancelled)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
