//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are assembled in [`crate::app`].

pub mod calculator;
pub mod categories;
pub mod shipping_config;
pub mod shipping_rates;
pub mod token;

use crate::error::AppError;

/// Log a failed write-through and produce the client-facing error.
///
/// Callers restore the in-memory record before returning it.
pub(crate) fn persistence_failed(
    record: &str,
    id: impl std::fmt::Display,
    err: sqlx::Error,
) -> AppError {
    tracing::error!(
        record,
        id = %id,
        error = %err,
        "database write failed, in-memory change reverted"
    );
    AppError::Internal(format!("failed to persist {record} {id}"))
}
