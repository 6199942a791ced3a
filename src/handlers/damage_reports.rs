use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::{DamageReport, DamageReportFilter, NewDamageReport},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

/// Router for damage report endpoints
pub fn damage_report_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_damage_reports))
        .route("/", post(create_damage_report))
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DamageReportQuery {
    pub order_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

/// List damage reports, optionally filtered by order or product
#[utoipa::path(
    get,
    path = "/api/v1/damage-reports",
    params(DamageReportQuery),
    responses((status = 200, description = "Damage reports listed", body = Vec<DamageReport>)),
    tag = "damage-reports"
)]
pub async fn list_damage_reports(
    State(state): State<AppState>,
    Query(query): Query<DamageReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = state
        .services
        .damage_reports
        .list(DamageReportFilter {
            order_id: query.order_id,
            product_id: query.product_id,
        })
        .await
        .map_err(map_service_error)?;
    Ok(success_response(reports))
}

/// File a damage report
#[utoipa::path(
    post,
    path = "/api/v1/damage-reports",
    request_body = NewDamageReport,
    responses(
        (status = 201, description = "Damage report created", body = DamageReport),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "damage-reports"
)]
pub async fn create_damage_report(
    State(state): State<AppState>,
    Json(payload): Json<NewDamageReport>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .damage_reports
        .create(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(created))
}
