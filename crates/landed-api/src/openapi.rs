//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Landed Cost API",
        version = "0.1.0",
        description = "Rate band, category and configuration management plus the public landed-cost calculator.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Calculator
        crate::routes::calculator::calculate,
        // Rate bands
        crate::routes::shipping_rates::list_bands,
        crate::routes::shipping_rates::create_band,
        crate::routes::shipping_rates::get_band,
        crate::routes::shipping_rates::replace_band,
        crate::routes::shipping_rates::patch_band,
        crate::routes::shipping_rates::delete_band,
        // Categories
        crate::routes::categories::list_categories,
        crate::routes::categories::create_category,
        crate::routes::categories::get_category,
        crate::routes::categories::replace_category,
        crate::routes::categories::patch_category,
        crate::routes::categories::delete_category,
        // Configuration
        crate::routes::shipping_config::get_config,
        crate::routes::shipping_config::replace_config,
        crate::routes::shipping_config::patch_config,
        // Auth
        crate::routes::token::issue_token,
    ),
    components(schemas(
        // Domain types
        landed_core::RateBand,
        landed_core::Category,
        landed_core::ShippingConfig,
        landed_core::OriginCountry,
        landed_core::Currency,
        landed_core::CalculationRequest,
        landed_core::Quote,
        landed_core::QuoteBreakdown,
        // Error types
        crate::error::ErrorBody,
        // DTOs
        crate::routes::shipping_rates::RateBandRequest,
        crate::routes::shipping_rates::RateBandPatch,
        crate::routes::categories::CategoryRequest,
        crate::routes::categories::CategoryPatch,
        crate::routes::shipping_config::ShippingConfigPatch,
        crate::routes::token::TokenRequest,
        crate::routes::token::TokenResponse,
    )),
    tags(
        (name = "calculator", description = "Public landed-cost quotes"),
        (name = "shipping_rates", description = "Weight-banded shipping prices per origin"),
        (name = "categories", description = "Product categories and duty rates"),
        (name = "shipping_config", description = "VAT, handling fee and margin"),
        (name = "auth", description = "Bearer token issuance"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
