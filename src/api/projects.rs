//! Project API endpoints
//!
//! Public (published projects only, projected by `?lang=`):
//! - GET /api/projects
//! - GET /api/projects/{slug}
//!
//! Admin:
//! - GET /api/admin/projects - All projects, projected
//! - GET /api/admin/projects/id/{id} - Raw multilingual record
//! - GET /api/admin/projects/{slug} - Any project by slug, projected
//! - POST /api/admin/projects
//! - PUT /api/admin/projects/{id}
//! - DELETE /api/admin/projects/{id}

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
use crate::models::{Project, CreateProjectInput, UpdateProjectInput};
use crate::services::{localize, localize_all};

/// Build the public project router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin project router
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
    let projects = state.project_service.list_published().await?;
    Ok(ApiResponse::ok(localize_all(&projects, query.locale())))
}

async fn get_published(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Value>, ApiError> {
    let project = state.project_service.get_published_by_slug(&slug).await?;
    Ok(ApiResponse::ok(localize(&project, query.locale())))
}

async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let projects = state.project_service.list().await?;
    Ok(ApiResponse::ok(localize_all(&projects, query.locale())))
}

async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Project>, ApiError> {
    Ok(ApiResponse::ok(state.project_service.get_by_id(id).await?))
}

async fn get_by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Value>, ApiError> {
    let project = state.project_service.get_by_slug(&slug).await?;
    Ok(ApiResponse::ok(localize(&project, query.locale())))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateProjectInput>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.project_service.create(input).await?;
    tracing::info!("Project created: {}", project.slug);
    Ok(ApiResponse::created(project))
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateProjectInput>,
) -> Result<ApiResponse<Project>, ApiError> {
    Ok(ApiResponse::ok(state.project_service.update(id, input).await?))
}

async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.project_service.delete(id).await?;
    tracing::info!("Project deleted: {}", id);
    Ok(StatusCode::NO_CONTENT)
}
