//! Body and query extraction for handlers.
//!
//! Handlers accept `Result<Json<T>, JsonRejection>` so that malformed input
//! surfaces as the flat JSON error body rather than axum's plain-text rejection.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::AppError;

/// Field rules checked after deserialization succeeds.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Unwrap a JSON body; a rejection becomes a 400.
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

/// [`extract_json`], then the type's [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let request = extract_json(body)?;
    request.validate()?;
    Ok(request)
}

pub fn extract_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}
