//! Skill API endpoints
//!
//! Public:
//! - GET /api/skills?lang= - Categories (projected title) with their skills
//!
//! Admin:
//! - GET|POST /api/admin/skills/categories
//! - GET /api/admin/skills/categories/id/{id}
//! - PUT|DELETE /api/admin/skills/categories/{id}
//! - GET|POST /api/admin/skills
//! - GET /api/admin/skills/id/{id}
//! - PUT|DELETE /api/admin/skills/{id}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde_json::Value;

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::api::responses::{ApiResponse, LangQuery};
use crate::models::{
    CreateSkillCategoryInput, CreateSkillInput, Skill, SkillCategory, UpdateSkillCategoryInput,
    UpdateSkillInput,
};
use crate::services::localize_all;

/// Build the public skills router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_grouped))
}

/// Build the admin skills router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/id/{id}", get(get_category))
        .route("/categories/{id}", put(update_category).delete(delete_category))
        .route("/", get(list_skills).post(create_skill))
        .route("/id/{id}", get(get_skill))
        .route("/{id}", put(update_skill).delete(delete_skill))
}

/// GET /api/skills
async fn list_grouped(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let groups = state.skill_service.list_grouped().await?;
    Ok(ApiResponse::ok(localize_all(&groups, query.locale())))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<SkillCategory>>, ApiError> {
    Ok(ApiResponse::ok(state.skill_service.list_categories().await?))
}

async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<SkillCategory>, ApiError> {
    Ok(ApiResponse::ok(state.skill_service.get_category(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateSkillCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.skill_service.create_category(input).await?;
    Ok(ApiResponse::created(category))
}

async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateSkillCategoryInput>,
) -> Result<ApiResponse<SkillCategory>, ApiError> {
    Ok(ApiResponse::ok(state.skill_service.update_category(id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.skill_service.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_skills(State(state): State<AppState>) -> Result<ApiResponse<Vec<Skill>>, ApiError> {
    Ok(ApiResponse::ok(state.skill_service.list_skills().await?))
}

async fn get_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Skill>, ApiError> {
    Ok(ApiResponse::ok(state.skill_service.get_skill(id).await?))
}

async fn create_skill(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateSkillInput>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.skill_service.create_skill(input).await?;
    Ok(ApiResponse::created(skill))
}

async fn update_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateSkillInput>,
) -> Result<ApiResponse<Skill>, ApiError> {
    Ok(ApiResponse::ok(state.skill_service.update_skill(id, input).await?))
}

async fn delete_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.skill_service.delete_skill(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
