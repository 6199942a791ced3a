use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState, models::ChecklistItem};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Router for arrival checklist endpoints, mounted under /inbound-orders
pub fn checklist_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/checklist", get(get_checklist))
        .route("/{id}/checklist/{item_id}", put(toggle_checklist_item))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ToggleChecklistRequest {
    pub done: bool,
}

/// Fetch the arrival checklist for an order
#[utoipa::path(
    get,
    path = "/api/v1/inbound-orders/{id}/checklist",
    params(("id" = Uuid, Path, description = "Inbound order ID")),
    responses(
        (status = 200, description = "Checklist items", body = Vec<ChecklistItem>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "checklist"
)]
pub async fn get_checklist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .checklist
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

/// Toggle one checklist item, optimistically with rollback on failure
#[utoipa::path(
    put,
    path = "/api/v1/inbound-orders/{id}/checklist/{item_id}",
    request_body = ToggleChecklistRequest,
    params(
        ("id" = Uuid, Path, description = "Inbound order ID"),
        ("item_id" = Uuid, Path, description = "Checklist item ID")
    ),
    responses(
        (status = 200, description = "Checklist after the toggle", body = Vec<ChecklistItem>),
        (status = 502, description = "Backend rejected the toggle; local state rolled back", body = crate::errors::ErrorResponse)
    ),
    tag = "checklist"
)]
pub async fn toggle_checklist_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ToggleChecklistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .checklist
        .toggle(id, item_id, payload.done)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}
