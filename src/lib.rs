//! Receiving Gateway Library
//!
//! Workflow orchestration for warehouse inbound receiving: order status
//! tracking, lot/pallet receiving sessions, put-away assignment, barcode
//! scanning, and damage reporting, over an external warehouse data API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;

#[cfg(test)]
pub mod test_fixtures;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub backend: Arc<dyn client::WarehouseBackend>,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        config: config::AppConfig,
        backend: Arc<dyn client::WarehouseBackend>,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(backend.clone(), event_sender.clone());
        Self {
            config,
            backend,
            event_sender,
            services,
        }
    }
}

/// All v1 API routes, grouped per screen the way the floor UI consumes them.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/inbound-orders",
            handlers::inbound_orders::inbound_order_routes()
                .merge(handlers::checklist::checklist_routes()),
        )
        .nest("/receiving", handlers::receiving::receiving_routes())
        .nest("/putaway", handlers::putaway::putaway_routes())
        .nest("/scan", handlers::scanners::scanner_routes())
        .nest(
            "/damage-reports",
            handlers::damage_reports::damage_report_routes(),
        )
        .merge(handlers::locations::location_routes())
}

/// Full application router: health + v1 API + Swagger UI.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "receiving-gateway up" }))
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "receiving-gateway",
        "backend": state.config.backend_kind,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
