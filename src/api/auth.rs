//! Authentication API endpoints
//!
//! - POST /api/auth/login - Exchange admin credentials for a token
//! - GET /api/auth/me - Current admin (requires token)

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

use crate::api::middleware::{enforce, ApiError, ApiJson, AppState, AuthenticatedAdmin, ClientIp};
use crate::api::responses::ApiResponse;
use crate::models::UserSummary;
use crate::services::{LoginInput, LoginResponse};

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// POST /api/auth/login
///
/// Every attempt counts toward the per-IP login budget, successful or not,
/// including ones whose body does not parse.
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    body: Result<ApiJson<LoginInput>, ApiError>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    if let Err(e) = enforce(state.rate_limiters.login.check(ip).await) {
        tracing::warn!("Login rate limit exceeded for {}", ip);
        return Err(e);
    }
    let ApiJson(body) = body?;

    let response = state.auth_service.login(body).await.map_err(|e| {
        tracing::debug!("Login failed from {}: {}", ip, e);
        ApiError::from(e)
    })?;
    Ok(ApiResponse::ok(response))
}

/// GET /api/auth/me
async fn me(AuthenticatedAdmin(user): AuthenticatedAdmin) -> ApiResponse<UserSummary> {
    ApiResponse::ok(UserSummary::from(&user))
}
