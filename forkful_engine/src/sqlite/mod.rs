//! SQLite backend for the Forkful engine.
mod sqlite_impl;

pub mod db;

pub use sqlite_impl::SqliteDatabase;
