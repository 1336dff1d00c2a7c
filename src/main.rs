// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::orchestrator::FetchOrchestrator;
use crate::application::session::SessionRegistry;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::supabase_gateway::SupabaseGateway;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_panels, refresh_dashboard, select_panel, show_dashboard, stream_dashboard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Resolved once, no runtime override
    let app_config = load_app_config()?;

    // Gateway (infrastructure layer)
    let gateway = Arc::new(SupabaseGateway::new(&app_config.backend));

    // Orchestration (application layer)
    let orchestrator = FetchOrchestrator::new(gateway);
    let sessions = SessionRegistry::new(orchestrator, app_config.server.refresh_interval());

    let state = Arc::new(AppState { sessions });

    // Router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(show_dashboard))
        .route("/dashboard/panels", get(list_panels))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/dashboard/panel", post(select_panel))
        .route("/dashboard/stream", get(stream_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = app_config.server.bind_addr.parse()?;
    tracing::info!(
        "Starting pipeline dashboard on {} (refresh every {}s)",
        addr,
        app_config.server.refresh_interval_secs
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
