//! # landed-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the landed-cost API.
//! Binds to the configured port (default 8080).

use landed_api::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;

    if !config.auth_enabled() {
        tracing::warn!(
            "Neither AUTH_TOKEN nor ADMIN_USERNAME/ADMIN_PASSWORD is set. \
             Authentication is disabled and every caller has admin access."
        );
    }

    // Initialize database pool (optional: absent means in-memory only).
    let db_pool = landed_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let port = config.port;
    let state = landed_api::AppState::with_config(config, db_pool);

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = landed_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Landed cost API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
