use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The event type the gateway emits when a checkout session has been paid in full.
pub const CHECKOUT_COMPLETED_EVENT: &str = "checkout.completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPaymentStatus {
    Unpaid,
    Paid,
    NoPaymentRequired,
}

impl SessionPaymentStatus {
    /// True when the gateway considers the session settled and an order may be materialized from it.
    pub fn is_complete(&self) -> bool {
        matches!(self, SessionPaymentStatus::Paid | SessionPaymentStatus::NoPaymentRequired)
    }
}

/// A checkout session as reported by the gateway, either from a `retrieve_session` call or embedded in a webhook
/// event. The `metadata` map is opaque correlation data: the gateway stores it verbatim at session creation and
/// echoes it back here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub payment_status: SessionPaymentStatus,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Total the gateway charged, in the smallest currency unit.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub line_items: Vec<SessionLineItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub name: String,
    /// Unit price in the smallest currency unit.
    pub unit_amount: i64,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Request body for opening a new checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub line_items: Vec<NewLineItem>,
    pub customer_email: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Inbound webhook payload. The gateway signs the raw body; signature verification happens at the HTTP layer before
/// this structure is ever deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub session: CheckoutSession,
}

impl WebhookEvent {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_COMPLETED_EVENT
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_deserializes_with_missing_optionals() {
        let json = r#"{"id": "cs_123", "payment_status": "unpaid"}"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "cs_123");
        assert!(!session.payment_status.is_complete());
        assert!(session.metadata.is_empty());
        assert!(session.line_items.is_empty());
    }

    #[test]
    fn webhook_event_roundtrip() {
        let json = r#"{
            "type": "checkout.completed",
            "session": {
                "id": "cs_987",
                "payment_status": "paid",
                "payment_intent": "pi_42",
                "customer_email": "diner@example.com",
                "metadata": {"subtotal": "40000"}
            }
        }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_checkout_completed());
        assert!(event.session.payment_status.is_complete());
        assert_eq!(event.session.metadata["subtotal"], "40000");
    }
}
