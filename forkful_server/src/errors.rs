use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use forkful_engine::{
    traits::{CustomerApiError, SettlementError, TrackingError},
    SettlementApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request is invalid. {0}")]
    ValidationError(String),
    #[error("The request cannot be carried out. {0}")]
    Rejected(String),
    #[error("The request conflicts with existing state. {0}")]
    Conflict(String),
    #[error("The payment session data is unusable. {0}")]
    DataIntegrity(String),
    #[error("The payment gateway did not respond in time. {0}")]
    UpstreamTimeout(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DataIntegrity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "error": self.to_string() }).to_string())
    }
}

impl From<SettlementApiError> for ServerError {
    fn from(e: SettlementApiError) -> Self {
        match e {
            SettlementApiError::ValidationError(msg) => Self::ValidationError(msg),
            SettlementApiError::SessionNotFound(id) => Self::NoRecordFound(format!("session {id}")),
            SettlementApiError::PaymentIncomplete(id) => {
                Self::Rejected(format!("Payment for session {id} has not completed yet"))
            },
            SettlementApiError::DataIntegrity(msg) => Self::DataIntegrity(msg),
            SettlementApiError::GatewayTimeout(msg) => Self::UpstreamTimeout(msg),
            SettlementApiError::GatewayError(msg) => Self::BackendError(msg),
            SettlementApiError::DatabaseError(inner) => inner.into(),
            SettlementApiError::CustomerError(inner) => inner.into(),
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::OrderNotFound(id) => Self::NoRecordFound(format!("order {id}")),
            SettlementError::OrderNotFoundForSession(id) => Self::NoRecordFound(format!("order for session {id}")),
            SettlementError::DuplicateSession(id) => Self::Conflict(format!("session {id} already has an order")),
            SettlementError::DuplicatePaymentIntent(msg) => Self::Conflict(msg),
            SettlementError::DatabaseError(msg) => Self::BackendError(msg),
            SettlementError::CustomerError(inner) => inner.into(),
        }
    }
}

impl From<TrackingError> for ServerError {
    fn from(e: TrackingError) -> Self {
        match e {
            TrackingError::TrackingNotFound(id) => Self::NoRecordFound(format!("tracking for order {id}")),
            TrackingError::TrackingAlreadyExists(id) => {
                Self::Conflict(format!("tracking already exists for order {id}"))
            },
            TrackingError::TerminalState { order_id, status } => {
                Self::Conflict(format!("tracking for order {order_id} is already {status}"))
            },
            TrackingError::NoRiderAssigned(id) => Self::Rejected(format!("no rider assigned to order {id}")),
            TrackingError::DatabaseError(msg) => Self::BackendError(msg),
        }
    }
}

impl From<CustomerApiError> for ServerError {
    fn from(e: CustomerApiError) -> Self {
        match e {
            CustomerApiError::CustomerNotFound(id) => Self::NoRecordFound(format!("customer {id}")),
            CustomerApiError::DatabaseError(msg) => Self::BackendError(msg),
        }
    }
}
