//! Dashboard Route
//!
//! - GET /api/v1/dashboard - Stock metrics, visits chart, lead metrics

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::auth::RequireSession;
use crate::backoffice::DashboardSummary;

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(state.dashboard.load().await?))
}
