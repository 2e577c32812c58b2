//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and conversions from service errors
//! - Bearer token authentication for admin routes
//! - Client IP resolution and the global per-IP rate limit

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        ConnectInfo, FromRequest, FromRequestParts, Request, State,
    },
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxAdminUserRepository, SqlxBlogRepository, SqlxContactRepository, SqlxCvFileRepository,
    SqlxProjectRepository, SqlxResumeRepository, SqlxSkillCategoryRepository,
    SqlxSkillRepository,
};
use crate::db::DynDatabasePool;
use crate::models::AdminUser;
use crate::services::token::extract_bearer_token;
use crate::services::{
    AuthError, AuthService, BlogService, ContactService, DynFileStorage, DynNotifier,
    ProjectService, RateLimitDecision, RateLimiters, ResumeService, ServiceError, SkillService,
    TokenService, UploadError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
    pub blog_service: Arc<BlogService>,
    pub project_service: Arc<ProjectService>,
    pub resume_service: Arc<ResumeService>,
    pub contact_service: Arc<ContactService>,
    pub skill_service: Arc<SkillService>,
    pub storage: DynFileStorage,
    pub rate_limiters: Arc<RateLimiters>,
}

impl AppState {
    /// Wire repositories and services on top of an open pool
    pub fn new(
        config: Config,
        pool: DynDatabasePool,
        storage: DynFileStorage,
        notifier: Option<DynNotifier>,
    ) -> Self {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds);
        let auth_service = AuthService::new(SqlxAdminUserRepository::boxed(pool.clone()), tokens);
        let resume_service = ResumeService::new(
            SqlxResumeRepository::boxed(pool.clone()),
            SqlxCvFileRepository::boxed(pool.clone()),
            storage.clone(),
            config.upload.max_cv_size,
        );
        let skill_service = SkillService::new(
            SqlxSkillCategoryRepository::boxed(pool.clone()),
            SqlxSkillRepository::boxed(pool.clone()),
        );

        Self {
            rate_limiters: Arc::new(RateLimiters::from_config(&config)),
            auth_service: Arc::new(auth_service),
            blog_service: Arc::new(BlogService::new(SqlxBlogRepository::boxed(pool.clone()))),
            project_service: Arc::new(ProjectService::new(SqlxProjectRepository::boxed(
                pool.clone(),
            ))),
            resume_service: Arc::new(resume_service),
            contact_service: Arc::new(ContactService::new(
                SqlxContactRepository::boxed(pool),
                notifier,
            )),
            skill_service: Arc::new(skill_service),
            storage,
            config: Arc::new(config),
        }
    }
}

/// Admin account resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub AdminUser);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ApiErrorDetail,
    /// Seconds until a rate-limited client may retry
    #[serde(skip)]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            retry_after: None,
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        let mut error = Self::new(code, message);
        error.error.details = Some(details);
        error
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        let mut error = Self::new("RATE_LIMITED", "Too many requests, please try again later");
        error.retry_after = Some(retry_after_secs);
        error
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            "SERVICE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = self.retry_after;
        let mut response = (status, Json(self)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            ServiceError::Conflict { field } => ApiError::with_details(
                "CONFLICT",
                format!("A record with this {} already exists", field),
                serde_json::json!({ "field": field }),
            ),
            ServiceError::Unavailable(message) => ApiError::service_unavailable(message),
            ServiceError::Validation(errors) => {
                let details = serde_json::to_value(&errors).unwrap_or_default();
                ApiError::with_details("VALIDATION_ERROR", "Validation failed", details)
            }
            ServiceError::InternalError(e) => {
                tracing::error!("Internal error: {:#}", e);
                ApiError::internal_error(e.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(e) => {
                tracing::error!("Authentication failed: {:#}", e);
                ApiError::internal_error(e.to_string())
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::with_details(
            "VALIDATION_ERROR",
            err.to_string(),
            serde_json::json!([{ "path": "file", "message": err.to_string() }]),
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

/// JSON body extractor that reports malformed bodies in the API error format
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor with the same error format, e.g. for non-numeric ids
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Require a valid admin bearer token
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string)
        .ok_or(AuthError::MissingToken)?;

    let user = state.auth_service.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedAdmin(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(AuthError::MissingToken.to_string()))
    }
}

/// Resolve the client address.
///
/// With `trust_proxy` the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise (or when neither parses) the socket peer is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        if let Some(ip) = forwarded {
            return ip;
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok());
        if let Some(ip) = real_ip {
            return ip;
        }
    }

    peer.map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Client address of the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(client_ip(
            &parts.headers,
            peer,
            state.config.server.trust_proxy,
        )))
    }
}

/// Turn a limiter decision into an error when over budget
pub fn enforce(decision: RateLimitDecision) -> Result<(), ApiError> {
    match decision {
        RateLimitDecision::Allowed { .. } => Ok(()),
        RateLimitDecision::Limited { retry_after_secs } => {
            Err(ApiError::rate_limited(retry_after_secs))
        }
    }
}

/// Global per-IP request budget
pub async fn api_rate_limit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(state.rate_limiters.api.check(ip).await)?;
    Ok(next.run(request).await)
}

/// Hide internal error messages from clients in production
pub async fn mask_internal_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if state.config.server.environment.is_production()
        && response.status() == StatusCode::INTERNAL_SERVER_ERROR
    {
        return ApiError::internal_error("Internal server error").into_response();
    }
    response
}
