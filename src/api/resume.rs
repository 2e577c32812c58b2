//! Resume API endpoints
//!
//! Public:
//! - GET /api/resume?lang= - All sections, projected
//! - GET /api/resume/cv - Download link of the published CV
//! - GET /api/resume/cv/download - The CV itself
//! - GET /api/resume/{sectionKey}?lang=
//!
//! Admin:
//! - GET /api/admin/resume/cv - CV metadata
//! - POST /api/admin/resume/cv - Replace the CV (multipart field `file`)
//! - GET /api/admin/resume, GET /id/{id}, GET /section/{sectionKey}
//! - POST /, PUT /{id}, DELETE /{id}

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde_json::Value;

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::api::responses::{ApiResponse, FileLinkResponse, LangQuery};
use crate::api::upload::read_file_field;
use crate::config::Config;
use crate::models::{CreateResumeSectionInput, CvFile, ResumeSection, UpdateResumeSectionInput};
use crate::services::{localize, localize_all};

/// Build the public resume router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sections))
        .route("/cv", get(cv_link))
        .route("/cv/download", get(download_cv))
        .route("/{section_key}", get(get_section_by_key))
}

/// Build the admin resume router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/cv", get(cv_info).post(upload_cv))
        .route("/", get(list_sections).post(create_section))
        .route("/id/{id}", get(get_section_by_id))
        .route("/section/{section_key}", get(get_section_by_key))
        .route("/{id}", put(update_section).delete(delete_section))
}

/// Absolute URL of the public CV download endpoint
fn download_url(config: &Config) -> String {
    format!(
        "{}/api/resume/cv/download",
        config.server.public_base_url.trim_end_matches('/')
    )
}

/// `Content-Disposition` for a download, with an ASCII fallback name and
/// the UTF-8 name percent-encoded.
fn content_disposition(file_name: &str) -> Option<HeaderValue> {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    );
    HeaderValue::from_str(&value).ok()
}

async fn list_sections(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let sections = state.resume_service.list().await?;
    Ok(ApiResponse::ok(localize_all(&sections, query.locale())))
}

async fn get_section_by_key(
    State(state): State<AppState>,
    ApiPath(section_key): ApiPath<String>,
    Query(query): Query<LangQuery>,
) -> Result<ApiResponse<Value>, ApiError> {
    let section = state.resume_service.get_by_key(&section_key).await?;
    Ok(ApiResponse::ok(localize(&section, query.locale())))
}

async fn get_section_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<ResumeSection>, ApiError> {
    Ok(ApiResponse::ok(state.resume_service.get_by_id(id).await?))
}

async fn create_section(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateResumeSectionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let section = state.resume_service.create(input).await?;
    tracing::info!("Resume section created: {}", section.section_key);
    Ok(ApiResponse::created(section))
}

async fn update_section(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateResumeSectionInput>,
) -> Result<ApiResponse<ResumeSection>, ApiError> {
    Ok(ApiResponse::ok(state.resume_service.update(id, input).await?))
}

async fn delete_section(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.resume_service.delete(id).await?;
    tracing::info!("Resume section deleted: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/resume/cv
async fn cv_link(State(state): State<AppState>) -> Result<ApiResponse<FileLinkResponse>, ApiError> {
    let cv = state.resume_service.get_cv().await?;
    Ok(ApiResponse::ok(FileLinkResponse {
        url: download_url(&state.config),
        file_name: cv.file_name,
    }))
}

/// GET /api/resume/cv/download
async fn download_cv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (cv, bytes) = state.resume_service.download_cv().await?;

    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&cv.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/pdf")),
    );
    if let Some(disposition) = content_disposition(&cv.file_name) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}

/// GET /api/admin/resume/cv
async fn cv_info(State(state): State<AppState>) -> Result<ApiResponse<CvFile>, ApiError> {
    Ok(ApiResponse::ok(state.resume_service.get_cv().await?))
}

/// POST /api/admin/resume/cv
async fn upload_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<FileLinkResponse>, ApiError> {
    let file = read_file_field(&mut multipart).await?;
    let cv = state
        .resume_service
        .upload_cv(file.file_name.as_deref(), &file.content_type, file.bytes)
        .await?;

    Ok(ApiResponse::ok(FileLinkResponse {
        url: download_url(&state.config),
        file_name: cv.file_name,
    }))
}
