//! Forkful Order Settlement & Delivery Tracking Engine
//!
//! This library contains the core logic of the Forkful food-ordering backend. It is store-agnostic: every
//! persistence concern is expressed as a trait in [`mod@traits`], and an SQLite backend is provided behind the
//! `sqlite` feature. The surrounding CRUD surfaces (catalog, profiles, promo codes, reports) are not part of this
//! crate; they talk to the same entity store but carry no settlement or tracking logic.
//!
//! The library is divided into three main sections:
//! 1. Database contracts and backends ([`mod@traits`], [`SqliteDatabase`]). You should never need to access the
//!    database directly; use the public APIs instead. The exception is the data types used by the store, which live
//!    in [`mod@db_types`] and are public.
//! 2. The public engine API ([`mod@api`]): [`SettlementApi`] turns completed payment sessions into exactly one
//!    durable order each, [`TrackingApi`] drives the delivery state machine, [`RiderMatcherApi`] answers geospatial
//!    pickup queries and [`CustomerApi`] exposes the customer order-history read surface.
//! 3. Events ([`mod@events`]): a small actor-based pub-sub channel. Every state-changing operation publishes one
//!    event after successful persistence, so observers (realtime push, audit, email) can hook in without touching
//!    the critical path.
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{
    customers_api::CustomerApi,
    errors::SettlementApiError,
    matcher_api::RiderMatcherApi,
    order_objects,
    settlement_api::SettlementApi,
    tracking_api::TrackingApi,
    tracking_objects,
};
