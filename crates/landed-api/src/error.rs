//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from landed-core to HTTP status codes and renders the
//! flat JSON body `{"error": <message>, "code": <CODE>}`.
//! Internal error details are logged and never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use landed_core::{BandError, CalculationError, CategoryInsertError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code (e.g., "NOT_FOUND", "NO_RATE_BAND").
    pub code: String,
    /// Additional context, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Calculation rejected (400, code depends on the cause).
    #[error("calculation failed: {0}")]
    Calculation(#[from] CalculationError),

    /// Authentication failure: missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure: insufficient permissions (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Feature not configured on this deployment (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Calculation(e) => match e {
                CalculationError::CategoryNotFound(_) => {
                    (StatusCode::BAD_REQUEST, "CATEGORY_NOT_FOUND")
                }
                CalculationError::NoRateBand { .. } => (StatusCode::BAD_REQUEST, "NO_RATE_BAND"),
                CalculationError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            },
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Client-facing message, without the variant prefix used in logs.
    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Calculation(e) => e.to_string(),
            Self::NotFound(m)
            | Self::Validation(m)
            | Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Conflict(m)
            | Self::ServiceUnavailable(m) => m.clone(),
        }
    }

    /// Structured details for errors that carry fields worth echoing.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Calculation(CalculationError::InvalidInput { field, .. }) => {
                Some(serde_json::json!({ "field": field }))
            }
            Self::Calculation(CalculationError::NoRateBand {
                billable_weight,
                origin,
            }) => Some(serde_json::json!({
                "billable_weight": billable_weight.to_string(),
                "origin": origin,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: self.client_message(),
            code: code.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Band write rejections. Overlaps are conflicts with stored state; the rest
/// are field errors.
impl From<BandError> for AppError {
    fn from(err: BandError) -> Self {
        match err {
            BandError::Overlap { .. } => Self::Conflict(err.to_string()),
            BandError::InvalidRange { .. }
            | BandError::NegativeWeight(_)
            | BandError::NegativePrice(_) => Self::Validation(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CategoryInsertError> for AppError {
    fn from(err: CategoryInsertError) -> Self {
        match err {
            CategoryInsertError::Invalid(e) => e.into(),
            CategoryInsertError::Duplicate(_) => Self::Conflict(err.to_string()),
        }
    }
}
