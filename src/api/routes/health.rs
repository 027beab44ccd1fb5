//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (record store and bucket reachable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if record_store_ok(&state) && object_store_ok(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let records_ok = record_store_ok(&state);
    let bucket_ok = object_store_ok(&state);

    let status = match (records_ok, bucket_ok) {
        (true, true) => "healthy",
        (false, false) => "unhealthy",
        _ => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        record_store: ok_or_error(records_ok),
        object_store: ok_or_error(bucket_ok),
        agent_webhook: if state.forwarder.is_configured() {
            "configured".to_string()
        } else {
            "not_configured".to_string()
        },
        realtime_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn ok_or_error(ok: bool) -> String {
    if ok { "ok" } else { "error" }.to_string()
}

fn record_store_ok(state: &AppState) -> bool {
    match state.records.ping() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Record store health check failed");
            false
        }
    }
}

fn object_store_ok(state: &AppState) -> bool {
    state.bucket.root().is_dir()
}
