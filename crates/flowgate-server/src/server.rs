//! Composition root: owns the shared state and runs the HTTP server.

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

use flowgate_core::client::WorkflowClient;
use flowgate_core::config::AppConfig;
use flowgate_core::ratelimit::RateLimiter;

use crate::routes;

/// Shared state handed to every handler.
///
/// The rate limiter is the one piece of mutable state shared across handler
/// tasks; it is constructed here, once, and injected. No module globals.
#[derive(Clone)]
pub struct AppState {
    pub client: WorkflowClient,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Result<Self> {
        Ok(Self {
            client: WorkflowClient::new(&cfg)?,
            limiter: Arc::new(RateLimiter::new()),
            config: Arc::new(cfg),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/workflow/echo", post(routes::echo))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(cfg: AppConfig) -> Result<()> {
    let state = AppState::new(cfg)?;
    let sweeper = state
        .limiter
        .spawn_sweeper(state.config.server.sweep_interval());

    let listener = tokio::net::TcpListener::bind(&state.config.server.listen_addr).await?;
    tracing::info!("flowgate listening on {}", listener.local_addr()?);

    let router = build_router(state);
    let result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await;

    sweeper.abort();
    result?;
    Ok(())
}
