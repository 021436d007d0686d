//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Rate bands and categories live in in-memory [`Store`]s. When a database
//! pool is configured, handlers write through to Postgres after the
//! in-memory mutation succeeds and the stores are hydrated on startup.
//!
//! Validation that depends on other records (band overlap, category name
//! uniqueness) runs under the same write lock as the insert.

use std::collections::HashMap;
use std::sync::Arc;

use landed_core::{
    overlap, sort_bands, BandError, Category, CategoryInsertError, OriginCountry, RateBand,
    RateStore, ShippingConfig,
};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::auth::TokenStore;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Run `f` with exclusive access to the whole map.
    ///
    /// Read-validate-write sequences that depend on other records go through
    /// here so no concurrent writer can interleave.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Configuration ------------------------------------------------------------

/// Default lifetime of issued bearer tokens.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Upper bound on `TOKEN_TTL_SECS`.
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;

/// Application configuration.
///
/// Custom `Debug` redacts secrets to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static admin bearer token.
    pub auth_token: Option<Zeroizing<String>>,
    /// Admin username accepted by `POST /api/token`.
    pub admin_username: Option<String>,
    /// Admin password accepted by `POST /api/token`.
    pub admin_password: Option<Zeroizing<String>>,
    /// Lifetime of issued tokens, in seconds.
    pub token_ttl_secs: u64,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns the value of an
    /// environment variable if set.
    ///
    /// Empty values count as unset. Admin credentials must be given together.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| format!("PORT: invalid port '{raw}': {e}"))?,
            None => 8080,
        };

        let token_ttl_secs = match get("TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| format!("TOKEN_TTL_SECS: invalid value '{raw}': {e}"))?;
                if secs == 0 || secs > MAX_TOKEN_TTL_SECS {
                    return Err(format!(
                        "TOKEN_TTL_SECS: must be between 1 and {MAX_TOKEN_TTL_SECS}, got {secs}"
                    ));
                }
                secs
            }
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        let admin_username = get("ADMIN_USERNAME");
        let admin_password = get("ADMIN_PASSWORD").map(Zeroizing::new);
        if admin_username.is_some() != admin_password.is_some() {
            return Err("ADMIN_USERNAME and ADMIN_PASSWORD must be set together".to_string());
        }

        Ok(Self {
            port,
            auth_token: get("AUTH_TOKEN").map(Zeroizing::new),
            admin_username,
            admin_password,
            token_ttl_secs,
        })
    }

    /// Whether `POST /api/token` can issue tokens.
    pub fn login_enabled(&self) -> bool {
        self.admin_username.is_some() && self.admin_password.is_some()
    }

    /// Whether any authentication mechanism is configured.
    pub fn auth_enabled(&self) -> bool {
        self.auth_token.is_some() || self.login_enabled()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            admin_username: None,
            admin_password: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Rate bands, keyed by id.
    pub rate_bands: Store<RateBand>,
    /// Product categories, keyed by id.
    pub categories: Store<Category>,
    /// Configuration singleton. `None` until first read or write.
    pub shipping_config: Arc<RwLock<Option<ShippingConfig>>>,
    /// Tokens issued by `POST /api/token`.
    pub tokens: TokenStore,
    /// PostgreSQL pool for write-through persistence. `None` means
    /// in-memory-only mode.
    pub db_pool: Option<PgPool>,
    /// Configuration.
    pub config: AppConfig,
}

/// Result of an in-place update: the record before and after.
pub type Replaced<T> = (T, T);

impl AppState {
    /// Create an in-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create a state with the given configuration and optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            rate_bands: Store::new(),
            categories: Store::new(),
            shipping_config: Arc::new(RwLock::new(None)),
            tokens: TokenStore::new(),
            db_pool,
            config,
        }
    }

    // -- Rate bands --

    /// All bands, optionally for one origin, in `(origin, min_weight)` order.
    pub fn sorted_bands(&self, origin: Option<OriginCountry>) -> Vec<RateBand> {
        let mut bands: Vec<RateBand> = self
            .rate_bands
            .list()
            .into_iter()
            .filter(|b| origin.map_or(true, |o| b.origin_country == o))
            .collect();
        sort_bands(&mut bands);
        bands
    }

    /// Validate `band` against the stored bands and insert it.
    pub fn create_band(&self, band: RateBand) -> Result<RateBand, BandError> {
        self.rate_bands.with_write(|map| {
            let existing: Vec<RateBand> = map.values().cloned().collect();
            overlap::validate(&band, &existing, None)?;
            map.insert(band.id, band.clone());
            Ok(band)
        })
    }

    /// Apply `edit` to the band with `id`, validate the result against every
    /// other band and store it.
    ///
    /// Returns `None` if the band does not exist.
    pub fn update_band(
        &self,
        id: Uuid,
        edit: impl FnOnce(&mut RateBand),
    ) -> Option<Result<Replaced<RateBand>, BandError>> {
        self.rate_bands.with_write(|map| {
            let previous = map.get(&id)?.clone();
            let mut candidate = previous.clone();
            edit(&mut candidate);
            candidate.id = id;

            let existing: Vec<RateBand> = map.values().cloned().collect();
            if let Err(e) = overlap::validate(&candidate, &existing, Some(id)) {
                return Some(Err(e));
            }
            map.insert(id, candidate.clone());
            Some(Ok((previous, candidate)))
        })
    }

    // -- Categories --

    /// All categories, ordered by name.
    pub fn sorted_categories(&self) -> Vec<Category> {
        let mut categories = self.categories.list();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        categories
    }

    /// Validate `category`, check its name is unused and insert it.
    pub fn create_category(&self, category: Category) -> Result<Category, CategoryInsertError> {
        category.validate().map_err(CategoryInsertError::Invalid)?;
        self.categories.with_write(|map| {
            if map.values().any(|c| c.name == category.name) {
                return Err(CategoryInsertError::Duplicate(category.name.clone()));
            }
            map.insert(category.id, category.clone());
            Ok(category)
        })
    }

    /// Apply `edit` to the category with `id`, validate and store it.
    ///
    /// Returns `None` if the category does not exist.
    pub fn update_category(
        &self,
        id: Uuid,
        edit: impl FnOnce(&mut Category),
    ) -> Option<Result<Replaced<Category>, CategoryInsertError>> {
        self.categories.with_write(|map| {
            let previous = map.get(&id)?.clone();
            let mut candidate = previous.clone();
            edit(&mut candidate);
            candidate.id = id;

            if let Err(e) = candidate.validate() {
                return Some(Err(CategoryInsertError::Invalid(e)));
            }
            if map.values().any(|c| c.name == candidate.name && c.id != id) {
                return Some(Err(CategoryInsertError::Duplicate(candidate.name)));
            }
            map.insert(id, candidate.clone());
            Some(Ok((previous, candidate)))
        })
    }

    // -- Shipping configuration --

    /// Return the configuration, creating it with defaults when absent.
    ///
    /// The flag is `true` when this call created it.
    pub fn config_or_default(&self) -> (ShippingConfig, bool) {
        if let Some(config) = self.shipping_config.read().as_ref() {
            return (config.clone(), false);
        }
        let mut slot = self.shipping_config.write();
        match slot.as_ref() {
            Some(config) => (config.clone(), false),
            None => {
                let config = ShippingConfig::default();
                *slot = Some(config.clone());
                (config, true)
            }
        }
    }

    /// Replace the configuration, returning the previous value.
    pub fn set_config(&self, config: ShippingConfig) -> Option<ShippingConfig> {
        self.shipping_config.write().replace(config)
    }

    /// Restore the configuration slot to `previous`.
    pub fn restore_config(&self, previous: Option<ShippingConfig>) {
        *self.shipping_config.write() = previous;
    }

    // -- Persistence --

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let bands = crate::db::rate_bands::load_all(pool)
            .await
            .map_err(|e| format!("failed to load rate bands: {e}"))?;
        let band_count = bands.len();
        for band in bands {
            self.rate_bands.insert(band.id, band);
        }

        let categories = crate::db::categories::load_all(pool)
            .await
            .map_err(|e| format!("failed to load categories: {e}"))?;
        let category_count = categories.len();
        for category in categories {
            self.categories.insert(category.id, category);
        }

        let config = crate::db::shipping_config::load(pool)
            .await
            .map_err(|e| format!("failed to load shipping config: {e}"))?;
        let config_present = config.is_some();
        *self.shipping_config.write() = config;

        tracing::info!(
            rate_bands = band_count,
            categories = category_count,
            shipping_config = config_present,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl RateStore for AppState {
    fn bands_for(&self, origin: OriginCountry) -> Vec<RateBand> {
        self.rate_bands
            .list()
            .into_iter()
            .filter(|b| b.origin_country == origin)
            .collect()
    }

    fn category_by_name(&self, name: &str) -> Option<Category> {
        self.categories.list().into_iter().find(|c| c.name == name)
    }

    fn config(&self) -> ShippingConfig {
        self.config_or_default().0
    }
}
