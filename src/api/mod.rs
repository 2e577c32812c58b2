//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints of the portfolio backend:
//! - Auth (login, current admin)
//! - Blogs, projects, resume, contact, skills (public + admin)
//! - Image uploads
//! - Health check and locally stored uploads

pub mod auth;
pub mod blogs;
pub mod contact;
pub mod middleware;
pub mod projects;
pub mod responses;
pub mod resume;
pub mod skills;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{Config, StorageDriver};

pub use middleware::{ApiError, AppState, AuthenticatedAdmin};

/// Headroom for multipart framing on top of the largest accepted file
const BODY_LIMIT_MARGIN: usize = 1024 * 1024;

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need an admin token)
    let admin_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/admin/blogs", blogs::admin_router())
        .nest("/admin/projects", projects::admin_router())
        .nest("/admin/resume", resume::admin_router())
        .nest("/admin/contact", contact::admin_router())
        .nest("/admin/skills", skills::admin_router())
        .nest("/admin/upload", upload::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/blogs", blogs::public_router())
        .nest("/projects", projects::public_router())
        .nest("/resume", resume::public_router())
        .nest("/contact", contact::public_router())
        .nest("/skills", skills::public_router())
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::api_rate_limit,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let body_limit = usize::try_from(config.upload.max_cv_size.max(config.upload.max_image_size))
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_MARGIN);

    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api", build_api_router(state.clone()));

    if config.storage.driver == StorageDriver::Local {
        router = router.nest_service("/uploads", ServeDir::new(&config.upload.path));
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::mask_internal_errors,
        ))
        .layer(cors_layer(&config))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS: any origin is mirrored in development, only configured origins
/// are allowed in production.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins = if config.server.environment.is_production() {
        let allowed: Vec<HeaderValue> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(allowed)
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(600))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::db::{create_test_pool, migrations};
    use crate::services::LocalStorage;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_router(config: Config) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let storage = Arc::new(LocalStorage::new(dir.path().to_path_buf(), ""));
        let state = AppState::new(config, pool, storage, None);
        (build_router(state), dir)
    }

    #[tokio::test]
    async fn test_security_headers() {
        let (app, _dir) = test_router(Config::default()).await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
    }

    #[tokio::test]
    async fn test_cors_mirrors_origin_in_development() {
        let (app, _dir) = test_router(Config::default()).await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/blogs")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");
        assert_eq!(headers["access-control-allow-credentials"], "true");
        assert_eq!(headers["access-control-max-age"], "600");
    }

    #[tokio::test]
    async fn test_cors_restricted_in_production() {
        let mut config = Config::default();
        config.server.environment = Environment::Production;
        config.server.cors_origins = vec!["https://example.com".to_string()];
        let (app, _dir) = test_router(config).await;

        let request = |origin: &'static str| {
            Request::builder()
                .uri("/health")
                .header("origin", origin)
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app.clone().oneshot(request("https://example.com")).await.unwrap();
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "https://example.com"
        );

        let denied = app.oneshot(request("https://evil.example")).await.unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_fallback_is_json() {
        let (app, _dir) = test_router(Config::default()).await;
        let response = app
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
