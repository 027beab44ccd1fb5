//! Sync Function
//!
//! - POST /functions/v1/sync-agent - Forward a stock update to the agent
//! - OPTIONS /functions/v1/sync-agent - CORS preflight
//!
//! Called from browsers of any origin, so it answers every request with its
//! own CORS headers and always with HTTP 200; the outcome is in the body.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::state::AppState;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

fn cors_headers() -> [(HeaderName, HeaderValue); 2] {
    [
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ),
    ]
}

/// ANY /functions/v1/sync-agent
pub async fn sync_agent(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, cors_headers()).into_response();
    }

    let reply = state.forwarder.forward_raw(&body).await;
    (StatusCode::OK, cors_headers(), Json(reply)).into_response()
}
