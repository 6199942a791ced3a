use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::putaway::{ConfirmAllOutcome, PutAwayBoardView},
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

/// Router for put-away board endpoints
pub fn putaway_routes() -> Router<AppState> {
    Router::new()
        .route("/boards", post(open_board))
        .route("/boards/{id}", get(get_board))
        .route("/boards/{id}", delete(close_board))
        .route(
            "/boards/{id}/items/{item_id}/sublocation",
            put(select_sublocation),
        )
        .route("/boards/{id}/items/{item_id}/confirm", post(confirm_line))
        .route("/boards/{id}/confirm-all", post(confirm_all))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OpenBoardRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SelectSublocationRequest {
    pub sublocation_id: Uuid,
}

/// Open a put-away board for an order's received lines
#[utoipa::path(
    post,
    path = "/api/v1/putaway/boards",
    request_body = OpenBoardRequest,
    responses(
        (status = 201, description = "Board opened with per-line suggestions", body = PutAwayBoardView),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "putaway"
)]
pub async fn open_board(
    State(state): State<AppState>,
    Json(payload): Json<OpenBoardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .putaway
        .open_board(payload.order_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(view))
}

/// Fetch current board state
#[utoipa::path(
    get,
    path = "/api/v1/putaway/boards/{id}",
    params(("id" = Uuid, Path, description = "Board ID")),
    responses(
        (status = 200, description = "Board state", body = PutAwayBoardView),
        (status = 404, description = "Board not found", body = crate::errors::ErrorResponse)
    ),
    tag = "putaway"
)]
pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .putaway
        .get_board(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Override the suggested sublocation for one line
#[utoipa::path(
    put,
    path = "/api/v1/putaway/boards/{id}/items/{item_id}/sublocation",
    request_body = SelectSublocationRequest,
    params(
        ("id" = Uuid, Path, description = "Board ID"),
        ("item_id" = Uuid, Path, description = "Line item ID")
    ),
    responses(
        (status = 200, description = "Sublocation selected", body = PutAwayBoardView),
        (status = 400, description = "Sublocation outside this location", body = crate::errors::ErrorResponse)
    ),
    tag = "putaway"
)]
pub async fn select_sublocation(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SelectSublocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .putaway
        .select_sublocation(id, item_id, payload.sublocation_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Confirm one line; irreversible for the session
#[utoipa::path(
    post,
    path = "/api/v1/putaway/boards/{id}/items/{item_id}/confirm",
    params(
        ("id" = Uuid, Path, description = "Board ID"),
        ("item_id" = Uuid, Path, description = "Line item ID")
    ),
    responses(
        (status = 200, description = "Line confirmed", body = PutAwayBoardView),
        (status = 400, description = "No sublocation selected or already confirmed", body = crate::errors::ErrorResponse)
    ),
    tag = "putaway"
)]
pub async fn confirm_line(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .services
        .putaway
        .confirm_line(id, item_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Confirm all targetable lines sequentially
#[utoipa::path(
    post,
    path = "/api/v1/putaway/boards/{id}/confirm-all",
    params(("id" = Uuid, Path, description = "Board ID")),
    responses(
        (status = 200, description = "Per-line outcomes; earlier confirmations stand on mid-batch failure", body = ConfirmAllOutcome)
    ),
    tag = "putaway"
)]
pub async fn confirm_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .putaway
        .confirm_all(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(outcome))
}

/// Discard a board
#[utoipa::path(
    delete,
    path = "/api/v1/putaway/boards/{id}",
    params(("id" = Uuid, Path, description = "Board ID")),
    responses((status = 204, description = "Board discarded")),
    tag = "putaway"
)]
pub async fn close_board(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.putaway.close_board(id);
    Ok(no_content_response())
}
