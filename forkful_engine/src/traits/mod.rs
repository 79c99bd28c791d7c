//! Contracts the engine's collaborators must satisfy.
//!
//! This module defines the traits a storage backend (and the payment gateway adapter) must implement to drive the
//! engine. The engine never talks to a database or the gateway directly; everything flows through these traits, so
//! backends can be swapped and the APIs can be exercised against mocks.
//!
//! * [`SettlementDatabase`] is the order-settlement contract: idempotent placeholder inserts, the exactly-once paid
//!   transition, and the unique-session arbiter that resolves concurrent materialization races.
//! * [`CustomerManagement`] is the customer/cart read-and-clear surface the settlement flow depends on. It is a
//!   supertrait of [`SettlementDatabase`]; settlement cannot work against a store that cannot resolve owners.
//! * [`TrackingDatabase`] owns the delivery tracking records: state transitions with append-only history, rider
//!   assignment, live location and the geospatial pickup query.
//! * [`PaymentSessionSource`] abstracts the payment gateway: create a session, fetch a session. The concrete client
//!   lives outside this crate and is wired in by the server.
mod customers;
mod session_source;
mod settlement;
mod tracking;

pub use customers::{CustomerApiError, CustomerManagement};
pub use session_source::{NewSessionRequest, PaymentSessionSource, SessionData, SessionHandle, SessionSourceError};
pub use settlement::{SettlementDatabase, SettlementError};
pub use tracking::{TrackingDatabase, TrackingError};
