//! # landed-api: Axum API Service for Landed-Cost Estimation
//!
//! Serves the public quote calculator and the admin surface for rate bands,
//! product categories and the shipping configuration.
//!
//! ## API Surface
//!
//! | Prefix                        | Module                          | Access            |
//! |-------------------------------|---------------------------------|-------------------|
//! | `/api/calculator/calculate`   | [`routes::calculator`]          | public            |
//! | `/api/shipping-rates/*`       | [`routes::shipping_rates`]      | reads public      |
//! | `/api/categories/*`           | [`routes::categories`]          | reads public      |
//! | `/api/shipping-config`        | [`routes::shipping_config`]     | reads public      |
//! | `/api/token`                  | [`routes::token`]               | public            |
//! | `/health/*`, `/metrics`       | this module                     | unauthenticated   |
//! | `/openapi.json`               | [`openapi`]                     | unauthenticated   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};

pub use error::AppError;
pub use state::{AppConfig, AppState};

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes, `/metrics` and `/openapi.json` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        static_token: state.config.auth_token.clone(),
        tokens: state.tokens.clone(),
        login_enabled: state.config.login_enabled(),
    };
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::calculator::router())
        .merge(routes::shipping_rates::router())
        .merge(routes::categories::router())
        .merge(routes::shipping_config::router())
        .merge(routes::token::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(Extension(auth_config));

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics_text))
        .merge(openapi::router());

    Router::new()
        .merge(unauthenticated)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(metrics))
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when the database (if configured) answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
        }
    }
    (StatusCode::OK, "ready")
}

/// Request counters in Prometheus text format.
async fn metrics_text(Extension(metrics): Extension<ApiMetrics>) -> Response {
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
