//! The read-only HTTP surface: `/`, `/status`, `/latency`, `/influxdata`,
//! `/quitquit`.

use crate::collection::Collection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use llama_config::TargetTable;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub collection: Arc<Collection>,
    pub targets: Arc<TargetTable>,
    pub interval: Duration,
    pub started_at: Instant,
    pub shutdown: CancellationToken,
}

/// Serves the HTTP surface on `addr` until `/quitquit` is hit, then returns.
pub async fn serve(addr: impl Into<SocketAddr>, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = addr.into();
    let shutdown = state.shutdown.clone();

    let router = Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/latency", get(latency))
        .route("/influxdata", get(influxdata))
        .route("/quitquit", get(quitquit))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "LLAMA collector HTTP surface listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

async fn status() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], "ok")
}

async fn latency(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(state.collection.stats())
}

async fn influxdata(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(state.collection.stats_influx())
}

async fn quitquit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::warn!("/quitquit requested, shutting down scheduler and HTTP server");
    state.shutdown.cancel();
    (StatusCode::OK, "Quitting...\n")
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    let uptime = state.started_at.elapsed();
    let targets = state
        .targets
        .targets()
        .iter()
        .map(|t| format!("<li>{} {:?}</li>", t.address, t.tags))
        .collect::<String>();

    let body = format!(
        "<html><head><title>LLAMA</title></head><body>\
         <h1>LLAMA collector</h1>\
         <p>interval: {}s</p>\
         <p>uptime: {}s</p>\
         <ul>{targets}</ul>\
         </body></html>",
        state.interval.as_secs(),
        uptime.as_secs(),
    );

    ([(header::CONTENT_TYPE, "text/html")], body).into_response()
}
