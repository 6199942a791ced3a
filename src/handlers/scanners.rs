use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::ScanWorkflow,
    services::scanner::{ScanFeedback, ScanSessionView},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Router for scanner endpoints
pub fn scanner_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}", delete(close_session))
        .route("/sessions/{id}/scan", post(scan))
        .route("/sessions/{id}/confirm", post(confirm))
        .route("/sessions/{id}/reset", post(reset))
        .route("/sessions/{id}/audio", put(set_audio))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OpenScanSessionRequest {
    pub workflow: ScanWorkflow,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ScanRequest {
    #[validate(length(min = 1))]
    pub code: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetAudioRequest {
    pub enabled: bool,
}

/// Open a scan session
#[utoipa::path(
    post,
    path = "/api/v1/scan/sessions",
    request_body = OpenScanSessionRequest,
    responses((status = 201, description = "Session opened", body = ScanSessionView)),
    tag = "scanners"
)]
pub async fn open_session(
    State(state): State<AppState>,
    Json(payload): Json<OpenScanSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .scanner
        .open_session(payload.workflow, payload.order_id);
    Ok(created_response(view))
}

/// Fetch current session state
#[utoipa::path(
    get,
    path = "/api/v1/scan/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = ScanSessionView),
        (status = 404, description = "Session not found", body = crate::errors::ErrorResponse)
    ),
    tag = "scanners"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .scanner
        .get_session(id)
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Process one scanned code
#[utoipa::path(
    post,
    path = "/api/v1/scan/sessions/{id}/scan",
    request_body = ScanRequest,
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Scan feedback; every scan is audited", body = ScanFeedback),
        (status = 404, description = "Session not found", body = crate::errors::ErrorResponse)
    ),
    tag = "scanners"
)]
pub async fn scan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let feedback = state
        .services
        .scanner
        .scan(id, &payload.code)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(feedback))
}

/// Commit the scanned pair
#[utoipa::path(
    post,
    path = "/api/v1/scan/sessions/{id}/confirm",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Action committed", body = ScanFeedback),
        (status = 400, description = "Pair incomplete or workflow has no confirm", body = crate::errors::ErrorResponse)
    ),
    tag = "scanners"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let feedback = state
        .services
        .scanner
        .confirm(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(feedback))
}

/// Clear the scanned pair
#[utoipa::path(
    post,
    path = "/api/v1/scan/sessions/{id}/reset",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses((status = 200, description = "Session cleared", body = ScanSessionView)),
    tag = "scanners"
)]
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.services.scanner.reset(id).map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Toggle advisory audio feedback
#[utoipa::path(
    put,
    path = "/api/v1/scan/sessions/{id}/audio",
    request_body = SetAudioRequest,
    params(("id" = Uuid, Path, description = "Session ID")),
    responses((status = 200, description = "Audio toggled", body = ScanSessionView)),
    tag = "scanners"
)]
pub async fn set_audio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAudioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .scanner
        .set_audio(id, payload.enabled)
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Discard a session
#[utoipa::path(
    delete,
    path = "/api/v1/scan/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses((status = 204, description = "Session discarded")),
    tag = "scanners"
)]
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.scanner.close_session(id);
    Ok(no_content_response())
}
