//! Blog API endpoints
//!
//! Public (published posts only, projected by `?lang=`):
//! - GET /api/blogs
//! - GET /api/blogs/{slug}
//!
//! Admin:
//! - GET /api/admin/blogs - All posts, projected
//! - GET /api/admin/blogs/id/{id} - Raw multilingual record
//! - GET /api/admin/blogs/{slug} - Any post by slug, projected
//! - POST /api/admin/blogs
//! - PUT /api/admin/blogs/{id}
//! - DELETE /api/admin/blogs/{id}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::Value;

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::api::responses::{ApiResponse, LangQuery};
use crate::models::{BlogPost, CreateBlogPostInput, UpdateBlogPostInput};
use crate::services::{localize, localize_all};

/// Build the public blog router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin blog router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all).post(create))
        .route("/id/{id}", get(get_by_id))
        // GET takes a slug, PUT and DELETE an id
        .route("/{key}", get(get_by_slug).put(update).delete(delete))
}

async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let posts = state.blog_service.list_published().await?;
    Ok(ApiResponse::ok(localize_all(&posts, query.locale())))
}

async fn get_published(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Value>, ApiError> {
    let post = state.blog_service.get_published_by_slug(&slug).await?;
    Ok(ApiResponse::ok(localize(&post, query.locale())))
}

async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let posts = state.blog_service.list().await?;
    Ok(ApiResponse::ok(localize_all(&posts, query.locale())))
}

async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<BlogPost>, ApiError> {
    Ok(ApiResponse::ok(state.blog_service.get_by_id(id).await?))
}

async fn get_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Value>, ApiError> {
    let post = state.blog_service.get_by_slug(&slug).await?;
    Ok(ApiResponse::ok(localize(&post, query.locale())))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateBlogPostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.blog_service.create(input).await?;
    tracing::info!("Blog post created: {}", post.slug);
    Ok(ApiResponse::created(post))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateBlogPostInput>,
) -> Result<ApiResponse<BlogPost>, ApiError> {
    Ok(ApiResponse::ok(state.blog_service.update(id, input).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog_service.delete(id).await?;
    tracing::info!("Blog post deleted: {}", id);
    Ok(StatusCode::NO_CONTENT)
}
