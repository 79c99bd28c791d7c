use std::collections::HashMap;

use thiserror::Error;

use crate::db_types::{OrderItem, SessionId};

/// The payment gateway as the engine sees it: an opaque service that opens checkout sessions and reports their
/// state. The concrete wire client lives outside this crate; the server wires it in. Implementations must bound
/// every call with a timeout and surface expiry as [`SessionSourceError::Timeout`] — on the webhook path the
/// gateway will redeliver, on the poll path the client retries, so a timeout is retryable, never a failure verdict.
#[allow(async_fn_in_trait)]
pub trait PaymentSessionSource: Clone {
    async fn create_session(&self, request: NewSessionRequest) -> Result<SessionHandle, SessionSourceError>;

    async fn retrieve_session(&self, session_id: &SessionId) -> Result<SessionData, SessionSourceError>;
}

/// What the engine sends the gateway when opening a session. The metadata map is opaque correlation data the
/// gateway stores verbatim and echoes back; settlement reconstructs the order from it.
#[derive(Debug, Clone)]
pub struct NewSessionRequest {
    pub line_items: Vec<OrderItem>,
    pub customer_email: String,
    pub metadata: HashMap<String, String>,
}

/// The gateway's answer to `create_session`: the session id and the URL the customer is redirected to.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub redirect_url: Option<String>,
}

/// A session's state as reported by the gateway, reduced to what settlement needs.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: SessionId,
    /// True when the gateway considers the session paid in full.
    pub payment_complete: bool,
    pub payment_intent_id: Option<String>,
    pub customer_email: Option<String>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Error)]
pub enum SessionSourceError {
    #[error("No checkout session exists with id {0}")]
    NotFound(SessionId),
    #[error("Gateway call timed out: {0}")]
    Timeout(String),
    #[error("Gateway protocol error: {0}")]
    Protocol(String),
}
