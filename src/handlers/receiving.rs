use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::Pallet,
    services::receiving::{LotEntry, ReceiveOutcome, ReceiveSessionView},
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

/// Router for receive session endpoints
pub fn receiving_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}", delete(close_session))
        .route("/sessions/{id}/lots", post(add_lot_entry))
        .route("/sessions/{id}/lots/{index}", put(update_lot_entry))
        .route("/sessions/{id}/quantity", put(set_quantity))
        .route("/sessions/{id}/pallet-mode", put(set_pallet_mode))
        .route("/sessions/{id}/pallet", post(select_pallet))
        .route("/sessions/{id}/pallet/new", post(create_pallet))
        .route("/sessions/{id}/submit", post(submit))
        .route("/pallets", get(list_pallets))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OpenSessionRequest {
    pub order_id: Uuid,
    pub item_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetPalletModeRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SelectPalletRequest {
    pub pallet_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreatePalletRequest {
    #[validate(length(min = 1))]
    pub container_type: String,
    pub lpn: Option<String>,
}

/// Open a receive session for one line item
#[utoipa::path(
    post,
    path = "/api/v1/receiving/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = ReceiveSessionView),
        (status = 400, description = "Order not receivable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn open_session(
    State(state): State<AppState>,
    Json(payload): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .open_session(payload.order_id, payload.item_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(view))
}

/// Fetch current session state
#[utoipa::path(
    get,
    path = "/api/v1/receiving/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = ReceiveSessionView),
        (status = 404, description = "Session not found", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .get_session(id)
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Append a lot entry row
#[utoipa::path(
    post,
    path = "/api/v1/receiving/sessions/{id}/lots",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Entry added", body = ReceiveSessionView),
        (status = 400, description = "Item is not lot tracked", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn add_lot_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .add_lot_entry(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Replace one lot entry row
#[utoipa::path(
    put,
    path = "/api/v1/receiving/sessions/{id}/lots/{index}",
    request_body = LotEntry,
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("index" = usize, Path, description = "Entry index")
    ),
    responses(
        (status = 200, description = "Entry updated", body = ReceiveSessionView),
        (status = 404, description = "Session or entry not found", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn update_lot_entry(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(entry): Json<LotEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .update_lot_entry(id, index, entry)
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Set the quantity for plain or pallet receiving
#[utoipa::path(
    put,
    path = "/api/v1/receiving/sessions/{id}/quantity",
    request_body = SetQuantityRequest,
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Quantity set", body = ReceiveSessionView)
    ),
    tag = "receiving"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .set_quantity(id, payload.quantity)
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Toggle pallet mode
#[utoipa::path(
    put,
    path = "/api/v1/receiving/sessions/{id}/pallet-mode",
    request_body = SetPalletModeRequest,
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Mode toggled", body = ReceiveSessionView)
    ),
    tag = "receiving"
)]
pub async fn set_pallet_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetPalletModeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .set_pallet_mode(id, payload.enabled)
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// List pallets available for selection
#[utoipa::path(
    get,
    path = "/api/v1/receiving/pallets",
    responses(
        (status = 200, description = "Pallets listed", body = Vec<Pallet>)
    ),
    tag = "receiving"
)]
pub async fn list_pallets(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let pallets = state
        .services
        .receiving
        .list_pallets()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(pallets))
}

/// Select an existing pallet for this session
#[utoipa::path(
    post,
    path = "/api/v1/receiving/sessions/{id}/pallet",
    request_body = SelectPalletRequest,
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Pallet selected", body = ReceiveSessionView),
        (status = 404, description = "Pallet not found", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn select_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectPalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .receiving
        .select_pallet(id, payload.pallet_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Create a pallet at receive time and select it
#[utoipa::path(
    post,
    path = "/api/v1/receiving/sessions/{id}/pallet/new",
    request_body = CreatePalletRequest,
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 201, description = "Pallet created and selected", body = Pallet),
        (status = 400, description = "Container type not allowed", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn create_pallet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let pallet = state
        .services
        .receiving
        .create_pallet(id, payload.container_type, payload.lpn)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(pallet))
}

/// Submit the receiving action
#[utoipa::path(
    post,
    path = "/api/v1/receiving/sessions/{id}/submit",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Receive outcome, including per-lot steps", body = ReceiveOutcome),
        (status = 400, description = "Validation failed, nothing submitted", body = crate::errors::ErrorResponse)
    ),
    tag = "receiving"
)]
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .receiving
        .submit(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(outcome))
}

/// Discard a session
#[utoipa::path(
    delete,
    path = "/api/v1/receiving/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses((status = 204, description = "Session discarded")),
    tag = "receiving"
)]
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.receiving.close_session(id);
    Ok(no_content_response())
}
