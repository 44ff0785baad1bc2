use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use encore_core::{Partition, ReservationOutcome};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

// Missing fields default to empty so they fail core validation with a 400
// instead of a JSON extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    #[serde(default)]
    pub table_ids: Vec<String>,
    #[serde(default)]
    pub event_id: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    #[serde(default)]
    pub table_ids: Vec<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub event_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    #[serde(default)]
    pub table_ids: Vec<String>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedQuery {
    pub user_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/availability", post(check_availability))
        .route("/v1/reservations", post(reserve))
        .route("/v1/reservations/release", post(release))
        .route("/v1/events/{event_id}/reservations", get(list_reserved))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/availability
async fn check_availability(
    State(state): State<AppState>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<Partition>, AppError> {
    let partition = state.reservations
        .check_availability(&req.table_ids, &req.event_id, req.user_id.as_deref())
        .await?;

    Ok(Json(partition))
}

/// POST /v1/reservations
/// Hold tables for a checkout session. Conflicts are reported, not rolled back.
async fn reserve(
    State(state): State<AppState>,
    Json(req): Json<ReserveRequest>,
) -> Result<Json<ReservationOutcome>, AppError> {
    let outcome = state.reservations
        .reserve(&req.table_ids, &req.user_id, &req.event_id)
        .await?;

    Ok(Json(outcome))
}

/// POST /v1/reservations/release
async fn release(
    State(state): State<AppState>,
    Json(req): Json<ReleaseRequest>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let released = state.reservations.release(&req.table_ids, &req.user_id)?;
    Ok(Json(ReleaseResponse { released }))
}

/// GET /v1/events/{event_id}/reservations?userId=
/// Tables held by someone other than `userId` (or by anyone)
async fn list_reserved(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<ReservedQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let reserved = state.reservations.list_reserved_for_event(&event_id, query.user_id.as_deref())?;
    Ok(Json(reserved))
}
