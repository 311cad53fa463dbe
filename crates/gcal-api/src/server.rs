//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::{Router, middleware};
use gcal_calendar::EventService;
use gcal_core::ApiConfig;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::middleware::auth::auth_middleware;
use crate::routes::{calendar_routes, public_routes};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub service: Arc<dyn EventService>,
}

/// Build the router with auth, tracing and CORS applied
pub fn build_router(state: AppState) -> Router {
    let protected = calendar_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP API server and run until `shutdown` resolves
pub async fn start_server(
    config: ApiConfig,
    service: Arc<dyn EventService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    if config.key.is_none() {
        info!("No API key configured; calendar endpoints are open");
    }

    let app = build_router(AppState { config, service });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP API stopped");
    Ok(())
}
