use super::common::{map_service_error, success_response};
use crate::{
    client::WarehouseBackend,
    errors::ApiError,
    handlers::AppState,
    models::{Location, Sublocation},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

/// Router for location lookups used by the put-away and scanner screens
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/locations/{id}/sublocations", get(list_sublocations))
}

/// List warehouse locations
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses((status = 200, description = "Locations listed", body = Vec<Location>)),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let locations = state
        .backend
        .get_locations()
        .await
        .map_err(|e| map_service_error(e.into()))?;
    Ok(success_response(locations))
}

/// List sublocations of a location
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}/sublocations",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses((status = 200, description = "Sublocations listed", body = Vec<Sublocation>)),
    tag = "locations"
)]
pub async fn list_sublocations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sublocations = state
        .backend
        .get_sublocations(id)
        .await
        .map_err(|e| map_service_error(e.into()))?;
    Ok(success_response(sublocations))
}
