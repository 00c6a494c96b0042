//! HTTP query API
//!
//! Exposes the `FleetMonitor` operations as JSON endpoints:
//! - `GET /health`, `GET /api/snapshot`, `GET /api/topology`
//! - `POST /api/refresh`
//! - `GET|PUT /api/auto-refresh`
//! - `GET|POST /api/peers`, `DELETE /api/peers/{id}`

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::monitor::{AutoRefreshStatus, FleetMonitor};
use crate::types::Snapshot;

// ─────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct ApiState {
    monitor: Arc<FleetMonitor>,
    start_time: Instant,
}

/// Build the router over a monitor
pub fn router(monitor: Arc<FleetMonitor>) -> Router {
    let state = ApiState {
        monitor,
        start_time: Instant::now(),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/topology", get(topology_handler))
        .route("/api/refresh", post(refresh_handler))
        .route(
            "/api/auto-refresh",
            get(get_auto_refresh_handler).put(set_auto_refresh_handler),
        )
        .route("/api/peers", get(list_peers_handler).post(add_peer_handler))
        .route("/api/peers/{id}", delete(remove_peer_handler))
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(monitor: Arc<FleetMonitor>, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::ServerBind {
            addr: addr.to_string(),
            source,
        })?;
    let local = listener.local_addr()?;
    info!(addr = %local, "Query API listening");

    axum::serve(listener, router(monitor))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Server(e.to_string()))?;

    info!("Query API stopped");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(v) if v.is_conflict() => StatusCode::CONFLICT,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    let snapshot = state.monitor.snapshot();
    Json(json!({
        "status": "healthy",
        "service": "fleetwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "round": snapshot.round,
        "ready": !snapshot.is_initial(),
        "refreshing": state.monitor.round_in_flight(),
        "registered": state.monitor.peer_count(),
        "peers": snapshot.peers.len(),
        "reachable": snapshot.reachable_count(),
    }))
}

fn snapshot_response(snapshot: &Snapshot) -> Response {
    Json(snapshot).into_response()
}

async fn snapshot_handler(State(state): State<Arc<ApiState>>) -> Response {
    snapshot_response(&state.monitor.snapshot())
}

async fn topology_handler(State(state): State<Arc<ApiState>>) -> Response {
    Json(state.monitor.topology()).into_response()
}

async fn refresh_handler(State(state): State<Arc<ApiState>>) -> Response {
    let snapshot = state.monitor.refresh_now().await;
    snapshot_response(&snapshot)
}

async fn get_auto_refresh_handler(State(state): State<Arc<ApiState>>) -> Json<AutoRefreshStatus> {
    Json(state.monitor.auto_refresh_status())
}

#[derive(Debug, Deserialize)]
struct AutoRefreshRequest {
    enabled: bool,
    #[serde(default)]
    interval_ms: Option<u64>,
}

async fn set_auto_refresh_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AutoRefreshRequest>,
) -> std::result::Result<Json<AutoRefreshStatus>, ApiError> {
    let interval = request
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| state.monitor.auto_refresh().1);

    state.monitor.set_auto_refresh(request.enabled, interval)?;
    Ok(Json(state.monitor.auto_refresh_status()))
}

async fn list_peers_handler(State(state): State<Arc<ApiState>>) -> Response {
    Json(state.monitor.peers()).into_response()
}

#[derive(Debug, Deserialize)]
struct AddPeerRequest {
    address: String,
    fallback_name: String,
    #[serde(default)]
    fallback_domain: String,
}

async fn add_peer_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AddPeerRequest>,
) -> std::result::Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    match state.monitor.add_peer(
        &request.address,
        &request.fallback_name,
        &request.fallback_domain,
    ) {
        Ok(id) => Ok((StatusCode::CREATED, Json(json!({ "id": id })))),
        Err(err) => {
            warn!(address = %request.address, error = %err, "Rejected peer");
            Err(err.into())
        }
    }
}

async fn remove_peer_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> std::result::Result<StatusCode, ApiError> {
    if state.monitor.remove_peer(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("peer '{}' is unknown or protected", id),
        ))
    }
}
