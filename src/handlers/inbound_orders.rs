use super::common::{map_service_error, success_response, validate_input};
use crate::{
    client::WarehouseBackend,
    errors::ApiError,
    handlers::AppState,
    models::{InboundOrder, InboundOrderStatus, WorkflowRules},
    services::reconciliation::{self, LineItemProgress, ReceivingSummary},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Router for inbound order endpoints
pub fn inbound_order_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_inbound_order))
        .route("/{id}/status", put(update_status))
        .route("/{id}/mark-complete", post(mark_complete))
        .route("/{id}/workflow-rules", get(get_workflow_rules))
        .route("/{id}/items/{item_id}/reject", post(reject_item))
}

/// Order detail view: the order plus the derived per-line reconciliation.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: InboundOrder,
    pub progress: Vec<LineItemProgress>,
    pub summary: ReceivingSummary,
}

impl From<InboundOrder> for OrderDetailResponse {
    fn from(order: InboundOrder) -> Self {
        let progress = reconciliation::order_progress(&order);
        let summary = reconciliation::receiving_summary(&order);
        Self {
            order,
            progress,
            summary,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: InboundOrderStatus,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RejectItemRequest {
    #[validate(range(min = 1))]
    pub qty: i32,
    #[validate(length(min = 1))]
    pub reason: String,
    pub notes: Option<String>,
}

/// Fetch an inbound order with its reconciliation view
#[utoipa::path(
    get,
    path = "/api/v1/inbound-orders/{id}",
    params(("id" = Uuid, Path, description = "Inbound order ID")),
    responses(
        (status = 200, description = "Order fetched", body = OrderDetailResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inbound-orders"
)]
pub async fn get_inbound_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .order_status
        .get_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderDetailResponse::from(order)))
}

/// Advance an order one status step forward
#[utoipa::path(
    put,
    path = "/api/v1/inbound-orders/{id}/status",
    request_body = UpdateStatusRequest,
    params(("id" = Uuid, Path, description = "Inbound order ID")),
    responses(
        (status = 200, description = "Status updated", body = OrderDetailResponse),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inbound-orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .order_status
        .advance_status(id, payload.status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderDetailResponse::from(order)))
}

/// Mark an arrived order received without item-level verification
#[utoipa::path(
    post,
    path = "/api/v1/inbound-orders/{id}/mark-complete",
    params(("id" = Uuid, Path, description = "Inbound order ID")),
    responses(
        (status = 200, description = "Order marked received", body = OrderDetailResponse),
        (status = 400, description = "Order is not arrived", body = crate::errors::ErrorResponse)
    ),
    tag = "inbound-orders"
)]
pub async fn mark_complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .order_status
        .mark_complete(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderDetailResponse::from(order)))
}

/// Fetch the client workflow rules governing this order's receiving
#[utoipa::path(
    get,
    path = "/api/v1/inbound-orders/{id}/workflow-rules",
    params(("id" = Uuid, Path, description = "Inbound order ID")),
    responses(
        (status = 200, description = "Workflow rules", body = WorkflowRules),
        (status = 400, description = "Rules payload not understood", body = crate::errors::ErrorResponse)
    ),
    tag = "inbound-orders"
)]
pub async fn get_workflow_rules(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = state
        .backend
        .get_inbound_workflow_rules_for_order(id)
        .await
        .map_err(|e| map_service_error(e.into()))?;
    rules
        .validate_loaded()
        .map_err(ApiError::ValidationError)?;
    Ok(success_response(rules))
}

/// Record rejected quantity against a line item
#[utoipa::path(
    post,
    path = "/api/v1/inbound-orders/{id}/items/{item_id}/reject",
    request_body = RejectItemRequest,
    params(
        ("id" = Uuid, Path, description = "Inbound order ID"),
        ("item_id" = Uuid, Path, description = "Line item ID")
    ),
    responses(
        (status = 200, description = "Rejection recorded", body = OrderDetailResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "inbound-orders"
)]
pub async fn reject_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RejectItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .receiving
        .reject_item(
            id,
            item_id,
            payload.qty,
            &payload.reason,
            payload.notes.as_deref(),
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderDetailResponse::from(order)))
}
