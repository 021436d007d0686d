//! # Landed Cost Calculator API
//!
//! - `POST /api/calculator/calculate`: quote shipping, duty, VAT, handling
//!   and margin for one parcel. Public.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};
use landed_core::{CalculationRequest, Quote};

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::middleware::metrics::ApiMetrics;
use crate::routes::shipping_config::current_config;
use crate::state::AppState;

/// Build the calculator router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/calculator/calculate", post(calculate))
}

/// POST /api/calculator/calculate: Compute a landed-cost quote.
///
/// Numeric fields accept numbers or numeric strings; missing ones count as
/// zero. `category` and `origin` are required.
#[utoipa::path(
    post,
    path = "/api/calculator/calculate",
    request_body = CalculationRequest,
    responses(
        (status = 200, description = "Quote with amounts rounded to 2 places", body = Quote),
        (status = 400, description = "Invalid input, unknown category or no covering band", body = crate::error::ErrorBody),
    ),
    tag = "calculator"
)]
pub async fn calculate(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
    body: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<Json<Quote>, AppError> {
    let req = extract_json(body)?;
    let input = req.parse()?;

    // Materializes the default configuration on first use.
    current_config(&state).await?;

    let quote = landed_core::quote(&state, &input).map_err(|e| {
        tracing::debug!(
            origin = %input.origin,
            category = %input.category,
            error = %e,
            "calculation rejected"
        );
        AppError::from(e)
    })?;

    metrics.record_quote();
    tracing::debug!(
        origin = %input.origin,
        category = %input.category,
        billable_weight = %quote.billable_weight,
        total = %quote.total,
        "quote calculated"
    );
    Ok(Json(quote))
}
