//! Car Routes
//!
//! - GET /api/v1/cars - Inventory list with filters
//! - POST /api/v1/cars - Create a car
//! - GET /api/v1/cars/:id - Load a car for editing
//! - PUT /api/v1/cars/:id - Save an edited car
//! - DELETE /api/v1/cars/:id - Delete, then return the reloaded list
//! - POST /api/v1/cars/:id/sold - Mark sold, then return the reloaded list
//!
//! Create and update respond with the save notice and the agent sync
//! notice side by side; a failed sync never fails the request.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::CarResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::auth::RequireSession;
use crate::backoffice::{CarDraft, CarFilter, CarsView, SubmitOutcome};

/// GET /api/v1/cars
pub async fn list_cars(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CarFilter>,
) -> ApiResult<Json<CarsView>> {
    Ok(Json(state.cars.list(&filter)?))
}

/// POST /api/v1/cars
pub async fn create_car(
    RequireSession(session): RequireSession,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CarDraft>,
) -> ApiResult<(StatusCode, Json<SubmitOutcome>)> {
    let outcome = state.car_form.submit(draft, None).await?;

    tracing::info!(
        car_id = outcome.car.id,
        operator = %session.email,
        synced = outcome.sync.synced,
        "Car created"
    );

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/cars/:id
pub async fn get_car(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CarResponse>> {
    let car = state.car_form.load(id)?;
    Ok(Json(CarResponse { car }))
}

/// PUT /api/v1/cars/:id
pub async fn update_car(
    RequireSession(session): RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(draft): Json<CarDraft>,
) -> ApiResult<Json<SubmitOutcome>> {
    let outcome = state.car_form.submit(draft, Some(id)).await?;

    tracing::info!(
        car_id = id,
        operator = %session.email,
        synced = outcome.sync.synced,
        "Car updated"
    );

    Ok(Json(outcome))
}

/// DELETE /api/v1/cars/:id
///
/// The car's photos stay in the bucket.
pub async fn delete_car(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(filter): Query<CarFilter>,
) -> ApiResult<Json<CarsView>> {
    Ok(Json(state.cars.delete(id, &filter)?))
}

/// POST /api/v1/cars/:id/sold
pub async fn mark_sold(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(filter): Query<CarFilter>,
) -> ApiResult<Json<CarsView>> {
    Ok(Json(state.cars.mark_sold(id, &filter)?))
}
