use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use http::HeaderValue;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use receiving_gateway as gateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = gateway::config::load_config()?;
    gateway::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Warehouse data API client; in-memory backend for local development
    let backend: Arc<dyn gateway::client::WarehouseBackend> = if cfg.uses_in_memory_backend() {
        info!("Using in-memory warehouse backend");
        Arc::new(gateway::client::InMemoryWarehouse::new())
    } else {
        Arc::new(
            gateway::client::HttpWarehouseBackend::new(
                &cfg.backend_base_url,
                cfg.backend_api_token.as_deref(),
            )
            .map_err(|e| anyhow::anyhow!("failed to build warehouse client: {}", e))?,
        )
    };

    // Init events
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = gateway::events::EventSender::new(event_tx);
    tokio::spawn(gateway::events::process_events(event_rx));

    // Compose shared app state
    let state = gateway::AppState::new(cfg.clone(), backend, event_sender);

    // Sweep abandoned receive/put-away/scan sessions
    let sweep_state = state.clone();
    let session_ttl = Duration::from_secs(cfg.session_ttl_secs);
    let sweep_interval = Duration::from_secs(cfg.session_sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let dropped = sweep_state.services.receiving.purge_stale(session_ttl)
                + sweep_state.services.putaway.purge_stale(session_ttl)
                + sweep_state.services.scanner.purge_stale(session_ttl);
            if dropped > 0 {
                info!("Swept {} stale sessions", dropped);
            }
        }
    });

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("No CORS origins configured; using permissive CORS");
        CorsLayer::permissive()
    };

    let app = gateway::app_router()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid listen address")?;
    info!("receiving-gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
