use thiserror::Error;

use crate::{
    db_types::SessionId,
    traits::{CustomerApiError, SessionSourceError, SettlementError},
};

#[derive(Debug, Error)]
pub enum SettlementApiError {
    /// Rejected before any store mutation.
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("No checkout session exists with id {0}")]
    SessionNotFound(SessionId),
    /// The session exists but the gateway does not consider it paid. A paid order must never be created from it.
    #[error("Session {0} has not completed payment")]
    PaymentIncomplete(SessionId),
    /// The session's correlation metadata is missing or unparsable. Synchronous callers see this error; the webhook
    /// boundary logs it and acknowledges the event so the gateway stops redelivering a poison pill.
    #[error("Session metadata is unusable: {0}")]
    DataIntegrity(String),
    /// The gateway call exceeded its bound. Retryable: the webhook will redeliver and the poll path retries.
    #[error("Gateway call timed out: {0}")]
    GatewayTimeout(String),
    #[error("Gateway error: {0}")]
    GatewayError(String),
    #[error("{0}")]
    DatabaseError(#[from] SettlementError),
    #[error("{0}")]
    CustomerError(#[from] CustomerApiError),
}

impl From<SessionSourceError> for SettlementApiError {
    fn from(e: SessionSourceError) -> Self {
        match e {
            SessionSourceError::NotFound(id) => SettlementApiError::SessionNotFound(id),
            SessionSourceError::Timeout(msg) => SettlementApiError::GatewayTimeout(msg),
            SessionSourceError::Protocol(msg) => SettlementApiError::GatewayError(msg),
        }
    }
}
