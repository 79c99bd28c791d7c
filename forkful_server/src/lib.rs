//! # Forkful delivery gateway server
//! This crate hosts the HTTP surface over the Forkful engine. It is responsible for:
//! * Opening checkout sessions and recording pending placeholder orders.
//! * Listening for signed payment webhook deliveries from the checkout gateway.
//! * Serving the client poll path and the manual order-reconciliation fallback.
//! * The order tracking surface: creation, status updates, rider assignment, live location and nearby matching.
//! * Fanning tracking and settlement events out to connected clients over server-sent events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod checkout_routes;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod live_updates;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
