//! Session Routes
//!
//! - POST /auth/v1/login - Open an operator session
//! - POST /auth/v1/logout - Close the current session
//! - GET /auth/v1/session - Describe the current session

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{LoginRequest, LoginResponse, MessageResponse, SessionResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::RequireSession;
use crate::notices;

/// POST /auth/v1/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.email.trim().is_empty() || req.access_key.is_empty() {
        return Err(ApiError::validation(notices::LOGIN_FAILED));
    }

    let session = state.sessions.login(&req.email, &req.access_key).await?;

    Ok(Json(LoginResponse {
        access_token: session.token,
        token_type: "bearer",
        email: session.email,
        expires_at: session.expires_at,
    }))
}

/// POST /auth/v1/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
) -> Json<MessageResponse> {
    state.sessions.logout(&session.token).await;

    Json(MessageResponse {
        message: notices::LOGGED_OUT,
    })
}

/// GET /auth/v1/session
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        email: session.email,
        expires_at: session.expires_at,
        guard_enabled: state.sessions.is_enabled(),
    })
}
