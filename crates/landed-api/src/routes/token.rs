//! # Token Issuance API
//!
//! - `POST /api/token`: exchange the admin credentials for a bearer token.
//!
//! Returns 503 when no admin credentials are configured.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::auth::credentials_match;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Credentials submitted for a token.
#[derive(Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Admin username.
    pub username: String,
    /// Admin password.
    #[schema(value_type = String, format = Password)]
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Validate for TokenRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "username and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// An issued bearer token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Token text to send as `Authorization: Bearer <access>`.
    pub access: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Build the token router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/token", post(issue_token))
}

/// POST /api/token: Issue a bearer token for the admin credentials.
#[utoipa::path(
    post,
    path = "/api/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 503, description = "Token issuance not configured", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn issue_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let (Some(expected_user), Some(expected_pass)) = (
        state.config.admin_username.as_deref(),
        state.config.admin_password.as_deref(),
    ) else {
        return Err(AppError::ServiceUnavailable(
            "token issuance is not configured".to_string(),
        ));
    };

    let req = extract_validated_json(body)?;
    if !credentials_match(&req.username, &req.password, expected_user, expected_pass) {
        tracing::warn!("token request rejected: invalid credentials");
        return Err(AppError::Unauthorized("invalid credentials".to_string()));
    }

    let issued = state.tokens.issue(state.config.token_ttl_secs);
    tracing::info!(expires_in = issued.expires_in, "bearer token issued");

    Ok(Json(TokenResponse {
        access: issued.access.to_string(),
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}
