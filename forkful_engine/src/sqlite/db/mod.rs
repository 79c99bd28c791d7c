//! Per-entity SQL helpers. Each function takes a bare connection so callers decide whether it runs standalone or
//! inside a transaction (pass `&mut *tx`).
pub(crate) mod customers;
pub(crate) mod orders;
pub(crate) mod tracking;

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation)
}
