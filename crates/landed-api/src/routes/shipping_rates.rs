//! # Shipping Rate Bands API
//!
//! Rate band management. Every write runs the overlap validator against the
//! stored bands for the same origin before anything is persisted.
//!
//! ## Endpoints
//!
//! - `GET /api/shipping-rates`: list bands, optionally `?origin_country=UK`
//! - `POST /api/shipping-rates`: create band (admin)
//! - `GET /api/shipping-rates/:id`: get band
//! - `PUT /api/shipping-rates/:id`: replace band (admin)
//! - `PATCH /api/shipping-rates/:id`: partial update (admin)
//! - `DELETE /api/shipping-rates/:id`: delete band (admin)

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use landed_core::{OriginCountry, RateBand};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query, extract_validated_json, Validate};
use crate::routes::persistence_failed;
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

/// Full band body for create and replace.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RateBandRequest {
    /// Origin the band applies to.
    pub origin_country: OriginCountry,
    /// Lower weight bound in kilograms.
    #[schema(value_type = f64)]
    pub min_weight: Decimal,
    /// Upper weight bound in kilograms.
    #[schema(value_type = f64)]
    pub max_weight: Decimal,
    /// Flat price for the band.
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl RateBandRequest {
    fn apply(self, band: &mut RateBand) {
        band.origin_country = self.origin_country;
        band.min_weight = self.min_weight;
        band.max_weight = self.max_weight;
        band.price = self.price;
    }
}

impl Validate for RateBandRequest {
    fn validate(&self) -> Result<(), AppError> {
        let candidate =
            RateBand::new(self.origin_country, self.min_weight, self.max_weight, self.price);
        candidate.check_fields().map_err(AppError::from)
    }
}

/// Partial band update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RateBandPatch {
    /// New origin.
    pub origin_country: Option<OriginCountry>,
    /// New lower bound.
    #[schema(value_type = Option<f64>)]
    pub min_weight: Option<Decimal>,
    /// New upper bound.
    #[schema(value_type = Option<f64>)]
    pub max_weight: Option<Decimal>,
    /// New price.
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}

impl RateBandPatch {
    fn apply(self, band: &mut RateBand) {
        if let Some(origin) = self.origin_country {
            band.origin_country = origin;
        }
        if let Some(min) = self.min_weight {
            band.min_weight = min;
        }
        if let Some(max) = self.max_weight {
            band.max_weight = max;
        }
        if let Some(price) = self.price {
            band.price = price;
        }
    }
}

/// Query parameters for the band listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BandListQuery {
    /// Restrict the listing to one origin (`USA` or `UK`).
    pub origin_country: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the shipping rates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping-rates", get(list_bands).post(create_band))
        .route(
            "/api/shipping-rates/:id",
            get(get_band)
                .put(replace_band)
                .patch(patch_band)
                .delete(delete_band),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /api/shipping-rates: List bands in `(origin, min_weight)` order.
#[utoipa::path(
    get,
    path = "/api/shipping-rates",
    params(BandListQuery),
    responses(
        (status = 200, description = "Bands in origin and weight order", body = Vec<RateBand>),
        (status = 422, description = "Unsupported origin", body = crate::error::ErrorBody),
    ),
    tag = "shipping_rates"
)]
pub async fn list_bands(
    State(state): State<AppState>,
    query: Result<Query<BandListQuery>, QueryRejection>,
) -> Result<Json<Vec<RateBand>>, AppError> {
    let query = extract_query(query)?;
    let origin = query
        .origin_country
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<OriginCountry>)
        .transpose()?;
    Ok(Json(state.sorted_bands(origin)))
}

/// POST /api/shipping-rates: Create a band.
#[utoipa::path(
    post,
    path = "/api/shipping-rates",
    request_body = RateBandRequest,
    responses(
        (status = 201, description = "Band created", body = RateBand),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 409, description = "Overlaps an existing band", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid range or negative value", body = crate::error::ErrorBody),
    ),
    tag = "shipping_rates"
)]
pub async fn create_band(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RateBandRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RateBand>), AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    let band = RateBand::new(req.origin_country, req.min_weight, req.max_weight, req.price);

    let band = state.create_band(band).map_err(|e| {
        tracing::warn!(origin = %req.origin_country, error = %e, "rate band rejected");
        AppError::from(e)
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::rate_bands::insert(pool, &band).await {
            state.rate_bands.remove(&band.id);
            return Err(persistence_failed("rate band", band.id, e));
        }
    }

    tracing::info!(id = %band.id, band = %band, "rate band created");
    Ok((StatusCode::CREATED, Json(band)))
}

/// GET /api/shipping-rates/:id: Get a single band.
#[utoipa::path(
    get,
    path = "/api/shipping-rates/{id}",
    params(("id" = Uuid, Path, description = "Band ID")),
    responses(
        (status = 200, description = "Band found", body = RateBand),
        (status = 404, description = "Band not found", body = crate::error::ErrorBody),
    ),
    tag = "shipping_rates"
)]
pub async fn get_band(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RateBand>, AppError> {
    state
        .rate_bands
        .get(&id)
        .map(Json)
        .ok_or_else(|| band_not_found(id))
}

/// PUT /api/shipping-rates/:id: Replace every field of a band.
#[utoipa::path(
    put,
    path = "/api/shipping-rates/{id}",
    params(("id" = Uuid, Path, description = "Band ID")),
    request_body = RateBandRequest,
    responses(
        (status = 200, description = "Band replaced", body = RateBand),
        (status = 404, description = "Band not found", body = crate::error::ErrorBody),
        (status = 409, description = "Overlaps another band", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid range or negative value", body = crate::error::ErrorBody),
    ),
    tag = "shipping_rates"
)]
pub async fn replace_band(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RateBandRequest>, JsonRejection>,
) -> Result<Json<RateBand>, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    store_update(&state, id, |band| req.apply(band)).await
}

/// PATCH /api/shipping-rates/:id: Update some fields of a band.
///
/// The merged record is validated as a whole.
#[utoipa::path(
    patch,
    path = "/api/shipping-rates/{id}",
    params(("id" = Uuid, Path, description = "Band ID")),
    request_body = RateBandPatch,
    responses(
        (status = 200, description = "Band updated", body = RateBand),
        (status = 404, description = "Band not found", body = crate::error::ErrorBody),
        (status = 409, description = "Overlaps another band", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid range or negative value", body = crate::error::ErrorBody),
    ),
    tag = "shipping_rates"
)]
pub async fn patch_band(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RateBandPatch>, JsonRejection>,
) -> Result<Json<RateBand>, AppError> {
    require_role(&caller, Role::Admin)?;
    let patch = extract_json(body)?;
    store_update(&state, id, |band| patch.apply(band)).await
}

/// DELETE /api/shipping-rates/:id: Delete a band.
#[utoipa::path(
    delete,
    path = "/api/shipping-rates/{id}",
    params(("id" = Uuid, Path, description = "Band ID")),
    responses(
        (status = 204, description = "Band deleted"),
        (status = 404, description = "Band not found", body = crate::error::ErrorBody),
    ),
    tag = "shipping_rates"
)]
pub async fn delete_band(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(&caller, Role::Admin)?;
    let removed = state.rate_bands.remove(&id).ok_or_else(|| band_not_found(id))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::rate_bands::delete(pool, id).await {
            state.rate_bands.insert(id, removed);
            return Err(persistence_failed("rate band", id, e));
        }
    }

    tracing::info!(id = %id, band = %removed, "rate band deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn store_update(
    state: &AppState,
    id: Uuid,
    edit: impl FnOnce(&mut RateBand),
) -> Result<Json<RateBand>, AppError> {
    let (previous, updated) = state
        .update_band(id, edit)
        .ok_or_else(|| band_not_found(id))?
        .map_err(|e| {
            tracing::warn!(id = %id, error = %e, "rate band update rejected");
            AppError::from(e)
        })?;

    if let Some(pool) = &state.db_pool {
        match crate::db::rate_bands::update(pool, &updated).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(id = %id, "rate band missing from database on update"),
            Err(e) => {
                state.rate_bands.insert(id, previous);
                return Err(persistence_failed("rate band", id, e));
            }
        }
    }

    tracing::info!(id = %id, band = %updated, "rate band updated");
    Ok(Json(updated))
}

fn band_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("rate band {id} not found"))
}
