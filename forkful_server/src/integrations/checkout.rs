//! Bridges the checkout gateway client into the engine's `PaymentSessionSource` contract, translating between the
//! gateway's wire types and the engine's session objects.
use checkout_tools::{CheckoutApi, CheckoutApiError, CheckoutSession, NewCheckoutSession, NewLineItem};
use fdg_common::INR_CURRENCY_CODE_LOWER;
use forkful_engine::{
    db_types::SessionId,
    traits::{NewSessionRequest, PaymentSessionSource, SessionData, SessionHandle, SessionSourceError},
};

#[derive(Clone)]
pub struct CheckoutGateway {
    api: CheckoutApi,
    success_url: String,
    cancel_url: String,
}

impl CheckoutGateway {
    pub fn new(api: CheckoutApi, frontend_base: &str) -> Self {
        let base = frontend_base.trim_end_matches('/');
        Self {
            api,
            success_url: format!("{base}/checkout?session_id={{CHECKOUT_SESSION_ID}}&payment=success"),
            cancel_url: format!("{base}/cancel"),
        }
    }
}

impl PaymentSessionSource for CheckoutGateway {
    async fn create_session(&self, request: NewSessionRequest) -> Result<SessionHandle, SessionSourceError> {
        let line_items = request
            .line_items
            .iter()
            .map(|item| NewLineItem {
                name: item.name.clone(),
                unit_amount: item.unit_price.value(),
                quantity: item.quantity,
                image_url: item.image_url.clone(),
            })
            .collect();
        let new_session = NewCheckoutSession {
            line_items,
            customer_email: request.customer_email,
            currency: INR_CURRENCY_CODE_LOWER.to_string(),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            metadata: request.metadata,
        };
        let session = self.api.create_session(&new_session).await.map_err(to_source_error)?;
        Ok(SessionHandle { session_id: SessionId::from(session.id), redirect_url: session.url })
    }

    async fn retrieve_session(&self, session_id: &SessionId) -> Result<SessionData, SessionSourceError> {
        let session = self.api.retrieve_session(session_id.as_str()).await.map_err(to_source_error)?;
        Ok(session_data_from(session))
    }
}

/// Reduces a gateway session to what settlement needs. Also used directly by the webhook handler, which receives
/// the full session embedded in the event payload.
pub fn session_data_from(session: CheckoutSession) -> SessionData {
    SessionData {
        id: SessionId::from(session.id),
        payment_complete: session.payment_status.is_complete(),
        payment_intent_id: session.payment_intent,
        customer_email: session.customer_email,
        metadata: session.metadata,
    }
}

fn to_source_error(e: CheckoutApiError) -> SessionSourceError {
    match e {
        CheckoutApiError::SessionNotFound(id) => SessionSourceError::NotFound(SessionId::from(id)),
        CheckoutApiError::Timeout(msg) => SessionSourceError::Timeout(msg),
        other => SessionSourceError::Protocol(other.to_string()),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use checkout_tools::SessionPaymentStatus;

    use super::*;

    #[test]
    fn session_data_carries_completion_and_metadata() {
        let session = CheckoutSession {
            id: "cs_1".to_string(),
            url: None,
            payment_status: SessionPaymentStatus::Paid,
            payment_intent: Some("pi_1".to_string()),
            customer_email: Some("diner@example.com".to_string()),
            currency: Some("inr".to_string()),
            amount_total: Some(47_000),
            metadata: HashMap::from([("subtotal".to_string(), "40000".to_string())]),
            line_items: vec![],
            created_at: None,
        };
        let data = session_data_from(session);
        assert!(data.payment_complete);
        assert_eq!(data.id.as_str(), "cs_1");
        assert_eq!(data.metadata["subtotal"], "40000");
    }
}
