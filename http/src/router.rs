use crate::error::AppError;
use axum::{
    extract::State,
    http::{
        header::CONTENT_TYPE,
        StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use eyre::{
    Context as _,
    Result,
};
use instagram_exporter_collector::SchedulerState;
use instagram_exporter_config::HEALTH_PATH;
use prometheus::{
    Encoder as _,
    Registry,
    TextEncoder,
};
use std::net::SocketAddr;
use tokio::{
    net::TcpListener,
    sync::watch,
};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub scheduler: watch::Receiver<SchedulerState>,
    pub metrics_path: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(&state.metrics_path, get(metrics))
        .route(HEALTH_PATH, get(healthz))
        .with_state(state)
}

/// Bind `address` and serve `router` until `shutdown` is cancelled.
pub async fn serve(address: SocketAddr, router: Router, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .wrap_err_with(|| format!("cannot listen on {address}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .wrap_err("HTTP server failed")
}

async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let encoder = TextEncoder::new();
    let families = state.registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    Ok(([(CONTENT_TYPE, encoder.format_type().to_string())], buffer))
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let scheduler = *state.scheduler.borrow();
    let status = match scheduler {
        SchedulerState::Stopped => StatusCode::SERVICE_UNAVAILABLE,
        SchedulerState::Created | SchedulerState::Warming | SchedulerState::Steady => StatusCode::OK,
    };
    (status, scheduler.to_string())
}
