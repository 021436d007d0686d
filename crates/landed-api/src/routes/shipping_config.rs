//! # Shipping Configuration API
//!
//! The singleton holding VAT, handling fee and margin. It is created with
//! defaults the first time anything reads it.
//!
//! ## Endpoints
//!
//! - `GET /api/shipping-config`: current configuration
//! - `PUT /api/shipping-config`: replace (admin)
//! - `PATCH /api/shipping-config`: partial update (admin)

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use landed_core::ShippingConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

impl Validate for ShippingConfig {
    fn validate(&self) -> Result<(), AppError> {
        ShippingConfig::validate(self).map_err(AppError::from)
    }
}

/// Partial configuration update.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShippingConfigPatch {
    /// VAT in percentage points.
    #[schema(value_type = Option<f64>)]
    pub vat_rate: Option<Decimal>,
    /// Flat handling fee.
    #[schema(value_type = Option<f64>)]
    pub local_handling_fee: Option<Decimal>,
    /// Margin in percentage points.
    #[schema(value_type = Option<f64>)]
    pub margin_rate: Option<Decimal>,
}

impl ShippingConfigPatch {
    fn apply(self, config: &mut ShippingConfig) {
        if let Some(vat) = self.vat_rate {
            config.vat_rate = vat;
        }
        if let Some(fee) = self.local_handling_fee {
            config.local_handling_fee = fee;
        }
        if let Some(margin) = self.margin_rate {
            config.margin_rate = margin;
        }
    }
}

/// Build the shipping configuration router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/shipping-config",
        get(get_config).put(replace_config).patch(patch_config),
    )
}

/// GET /api/shipping-config: Return the configuration, creating it if absent.
#[utoipa::path(
    get,
    path = "/api/shipping-config",
    responses(
        (status = 200, description = "Current configuration", body = ShippingConfig),
    ),
    tag = "shipping_config"
)]
pub async fn get_config(State(state): State<AppState>) -> Result<Json<ShippingConfig>, AppError> {
    current_config(&state).await.map(Json)
}

/// PUT /api/shipping-config: Replace the configuration.
#[utoipa::path(
    put,
    path = "/api/shipping-config",
    request_body = ShippingConfig,
    responses(
        (status = 200, description = "Configuration replaced", body = ShippingConfig),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 422, description = "Negative rate or fee", body = crate::error::ErrorBody),
    ),
    tag = "shipping_config"
)]
pub async fn replace_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<ShippingConfig>, JsonRejection>,
) -> Result<Json<ShippingConfig>, AppError> {
    require_role(&caller, Role::Admin)?;
    let config = extract_validated_json(body)?;
    let previous = state.set_config(config.clone());
    persist(&state, &config, previous).await?;
    Ok(Json(config))
}

/// PATCH /api/shipping-config: Update some configuration fields.
#[utoipa::path(
    patch,
    path = "/api/shipping-config",
    request_body = ShippingConfigPatch,
    responses(
        (status = 200, description = "Configuration updated", body = ShippingConfig),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody),
        (status = 422, description = "Negative rate or fee", body = crate::error::ErrorBody),
    ),
    tag = "shipping_config"
)]
pub async fn patch_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<ShippingConfigPatch>, JsonRejection>,
) -> Result<Json<ShippingConfig>, AppError> {
    require_role(&caller, Role::Admin)?;
    let patch = extract_json(body)?;

    // Merge under the write lock so concurrent patches do not lose fields.
    let (merged, previous) = {
        let mut slot = state.shipping_config.write();
        let previous = slot.clone();
        let mut merged = previous.clone().unwrap_or_default();
        patch.apply(&mut merged);
        if let Err(e) = merged.validate() {
            tracing::warn!(error = %e, "shipping config update rejected");
            return Err(e.into());
        }
        *slot = Some(merged.clone());
        (merged, previous)
    };

    persist(&state, &merged, previous).await?;
    Ok(Json(merged))
}

/// Return the stored configuration, creating and persisting the defaults
/// on first access.
pub(crate) async fn current_config(state: &AppState) -> Result<ShippingConfig, AppError> {
    let (config, created) = state.config_or_default();
    if !created {
        return Ok(config);
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::shipping_config::upsert(pool, &config).await {
            let mut slot = state.shipping_config.write();
            if slot.as_ref() == Some(&config) {
                *slot = None;
            }
            drop(slot);
            return Err(super::persistence_failed("shipping config", 1, e));
        }
    }

    tracing::info!(config = ?config, "shipping config created with defaults");
    Ok(config)
}

async fn persist(
    state: &AppState,
    config: &ShippingConfig,
    previous: Option<ShippingConfig>,
) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::shipping_config::upsert(pool, config).await {
            state.restore_config(previous);
            return Err(super::persistence_failed("shipping config", 1, e));
        }
    }
    tracing::info!(
        vat_rate = %config.vat_rate,
        local_handling_fee = %config.local_handling_fee,
        margin_rate = %config.margin_rate,
        "shipping config updated"
    );
    Ok(())
}
