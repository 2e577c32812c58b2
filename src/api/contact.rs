//! Contact API endpoints
//!
//! Public:
//! - GET /api/contact - Contact links
//! - POST /api/contact/send-message - Contact form (rate limited per IP)
//!
//! Admin:
//! - GET /api/admin/contact, GET /id/{id}, POST /, PUT /{id}, DELETE /{id}

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use crate::api::middleware::{enforce, ApiError, ApiJson, ApiPath, AppState, ClientIp};
use crate::api::responses::{ApiResponse, MessageResponse};
use crate::models::{Contact, ContactMessageInput, CreateContactInput, UpdateContactInput};

/// Build the public contact router
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts))
        .route("/send-message", post(send_message))
}

/// Build the admin contact router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route("/id/{id}", get(get_contact))
        .route("/{id}", put(update_contact).delete(delete_contact))
}

async fn list_contacts(State(state): State<AppState>) -> Result<ApiResponse<Vec<Contact>>, ApiError> {
    Ok(ApiResponse::ok(state.contact_service.list().await?))
}

async fn get_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Contact>, ApiError> {
    Ok(ApiResponse::ok(state.contact_service.get_by_id(id).await?))
}

async fn create_contact(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateContactInput>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = state.contact_service.create(input).await?;
    Ok(ApiResponse::created(contact))
}

async fn update_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateContactInput>,
) -> Result<ApiResponse<Contact>, ApiError> {
    Ok(ApiResponse::ok(state.contact_service.update(id, input).await?))
}

async fn delete_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.contact_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/contact/send-message
///
/// Responds as soon as the message is accepted; delivery happens in the
/// background.
async fn send_message(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    input: Result<ApiJson<ContactMessageInput>, ApiError>,
) -> Result<MessageResponse, ApiError> {
    if let Err(e) = enforce(state.rate_limiters.contact.check(ip).await) {
        tracing::warn!("Contact rate limit exceeded for {}", ip);
        return Err(e);
    }
    let ApiJson(input) = input?;

    state.contact_service.send_message(input).await?;
    Ok(MessageResponse::ok("Message sent"))
}
