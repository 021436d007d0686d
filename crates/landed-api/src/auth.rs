//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with two roles: anonymous `Public` callers may
//! read rates and request quotes, `Admin` callers may also write.
//!
//! ## Tokens
//!
//! Two kinds of bearer token are accepted:
//!
//! - a static token from `AUTH_TOKEN`, compared in constant time;
//! - tokens issued by `POST /api/token` in exchange for the admin
//!   credentials. These are 256 random bits, hex encoded. Only their
//!   SHA-256 digest is kept, together with an expiry.
//!
//! A request without an `Authorization` header is `Public`. A header that is
//! present but does not carry a valid bearer token is rejected with 401.
//!
//! When neither a static token nor admin credentials are configured the
//! middleware treats every caller as `Admin` (development mode).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::error::{AppError, ErrorBody};

// ── Role ────────────────────────────────────────────────────────────────────

/// Caller roles, ordered by privilege level.
///
/// The `Ord` derivation respects variant declaration order (`Public < Admin`),
/// so access checks are a single `>=` comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Anonymous caller: read rates, request quotes.
    Public,
    /// Full access, including rate, category and configuration writes.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Admin => "admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the caller, injected by [`auth_middleware`] and available to
/// handlers through `FromRequestParts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role.
    pub role: Role,
}

impl CallerIdentity {
    /// Anonymous caller.
    pub fn public() -> Self {
        Self { role: Role::Public }
    }

    /// Administrator.
    pub fn admin() -> Self {
        Self { role: Role::Admin }
    }

    /// Check if the caller has at least the given minimum role.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }
}

/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Issued Tokens ───────────────────────────────────────────────────────────

/// Number of random bytes in an issued token.
const TOKEN_BYTES: usize = 32;

/// Issued bearer tokens, keyed by the SHA-256 digest of the token text.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    issued: Arc<RwLock<HashMap<[u8; 32], DateTime<Utc>>>>,
}

/// A freshly issued token. The plaintext exists only in this value and the
/// response that carries it.
#[derive(Debug)]
pub struct IssuedToken {
    /// Hex-encoded token text.
    pub access: Zeroizing<String>,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

impl TokenStore {
    /// Create an empty token store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token valid for `ttl_secs`. Expired entries are pruned.
    pub fn issue(&self, ttl_secs: u64) -> IssuedToken {
        let mut raw = Zeroizing::new([0u8; TOKEN_BYTES]);
        OsRng.fill_bytes(&mut raw[..]);
        let access: Zeroizing<String> =
            Zeroizing::new(raw.iter().map(|b| format!("{b:02x}")).collect());

        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_secs as i64);
        let mut issued = self.issued.write();
        issued.retain(|_, expiry| *expiry > now);
        issued.insert(digest(&access), expires_at);

        IssuedToken {
            access,
            expires_in: ttl_secs,
        }
    }

    /// Whether `token` was issued here and has not expired.
    pub fn verify(&self, token: &str) -> bool {
        let key = digest(token);
        let now = Utc::now();
        match self.issued.read().get(&key) {
            Some(expiry) => *expiry > now,
            None => false,
        }
    }

    /// Number of tokens currently held, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.issued.read().len()
    }

    /// Whether no tokens are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Static admin bearer token.
    pub static_token: Option<Zeroizing<String>>,
    /// Tokens issued through `POST /api/token`.
    pub tokens: TokenStore,
    /// Whether token issuance is configured. When false and no static token
    /// is set, authentication is disabled.
    pub login_enabled: bool,
}

impl AuthConfig {
    /// Whether any authentication mechanism is configured.
    pub fn is_enabled(&self) -> bool {
        self.static_token.is_some() || self.login_enabled
    }

    /// Whether `provided` is the static token or a live issued token.
    fn accepts(&self, provided: &str) -> bool {
        let static_ok = self
            .static_token
            .as_ref()
            .map(|expected| constant_time_token_eq(provided, expected))
            .unwrap_or(false);
        static_ok || self.tokens.verify(provided)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "static_token",
                &self.static_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("issued_tokens", &self.tokens.len())
            .field("login_enabled", &self.login_enabled)
            .finish()
    }
}

// ── Credential Checks ───────────────────────────────────────────────────────

/// Constant-time comparison of secrets.
///
/// When lengths differ, performs a dummy comparison so timing does not
/// depend on where the inputs diverge.
pub fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Check a username/password pair. Both comparisons always run.
pub fn credentials_match(
    username: &str,
    password: &str,
    expected_username: &str,
    expected_password: &str,
) -> bool {
    let user_ok = constant_time_token_eq(username, expected_username);
    let pass_ok = constant_time_token_eq(password, expected_password);
    user_ok & pass_ok
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the caller's identity from the `Authorization` header and inject
/// it into request extensions.
///
/// - no header: `Public`
/// - `Bearer <token>` with a valid token: `Admin`
/// - anything else: 401
///
/// With authentication disabled every request is `Admin`.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    if !config.is_enabled() {
        request.extensions_mut().insert(CallerIdentity::admin());
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = match auth_header {
        None => CallerIdentity::public(),
        Some(header_value) => match header_value.strip_prefix("Bearer ") {
            Some(provided) if config.accepts(provided.trim()) => CallerIdentity::admin(),
            Some(_) => {
                tracing::warn!("authentication failed: invalid or expired bearer token");
                return unauthorized_response("invalid or expired bearer token");
            }
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return unauthorized_response("authorization header must use Bearer scheme");
            }
        },
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
        code: "UNAUTHORIZED".to_string(),
        details: None,
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
