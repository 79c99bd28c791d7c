//! Thin client for the hosted checkout gateway.
//!
//! The gateway is an external service: we hand it line items and correlation metadata, it hands back a redirect URL
//! where the customer completes payment. Completion is reported back to us asynchronously via a signed webhook, and
//! on demand via [`CheckoutApi::retrieve_session`]. This crate only speaks the wire protocol; all settlement logic
//! lives in `forkful_engine`.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::CheckoutApi;
pub use config::CheckoutConfig;
pub use data_objects::{
    CheckoutSession,
    NewCheckoutSession,
    NewLineItem,
    SessionLineItem,
    SessionPaymentStatus,
    WebhookEvent,
    CHECKOUT_COMPLETED_EVENT,
};
pub use error::CheckoutApiError;
