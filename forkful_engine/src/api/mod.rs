//! The public engine API.
//!
//! The pattern for every API here is the same: an API instance is created by supplying a backend that implements
//! the traits the API needs, plus any injected policy (pricing, restaurant origin) and the event producers it
//! should publish to.
//!
//! * [`settlement_api`] turns checkout sessions into orders — the only place settlement logic lives.
//! * [`tracking_api`] owns the delivery state machine and its realtime fan-out.
//! * [`matcher_api`] answers the geospatial "what can I pick up near here" query for riders.
//! * [`customers_api`] is the thin customer/cart read surface.
pub mod customers_api;
pub mod errors;
pub mod matcher_api;
pub mod order_objects;
pub mod settlement_api;
pub mod tracking_api;
pub mod tracking_objects;
