//! Lead Routes
//!
//! - GET /api/v1/leads - Lead list with filters and ordering
//! - GET /api/v1/leads/:id - Lead detail
//! - PATCH /api/v1/leads/:id/financing - Change the financing status

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FinancingRequest, LeadResponse, LeadsQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::RequireSession;
use crate::backoffice::LeadsView;
use crate::records::FinancingStatus;

/// GET /api/v1/leads
pub async fn list_leads(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeadsQuery>,
) -> ApiResult<Json<LeadsView>> {
    Ok(Json(state.leads.list(&query.filter(), query.direction())?))
}

/// GET /api/v1/leads/:id
pub async fn get_lead(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<LeadResponse>> {
    let lead = state.leads.detail(id)?;
    Ok(Json(LeadResponse { lead, notice: None }))
}

/// PATCH /api/v1/leads/:id/financing
pub async fn update_financing(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<FinancingRequest>,
) -> ApiResult<Json<LeadResponse>> {
    let status: FinancingStatus = req.status.parse().map_err(ApiError::validation)?;
    let lead = state.leads.update_financing(id, status)?;

    Ok(Json(LeadResponse {
        lead,
        notice: Some(crate::notices::FINANCING_UPDATED),
    }))
}
