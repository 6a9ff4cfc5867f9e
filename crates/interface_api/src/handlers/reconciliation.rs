//! Reconciliation handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ReconciliationId;

use crate::dto::reconciliation::{
    FinalizeRequest, RecordCountsRequest, RecordCountsResponse, SessionResponse,
    StartReconciliationRequest,
};
use crate::{error::ApiError, AppState};

/// `POST /api/v1/reconciliations`
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartReconciliationRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    request.validate()?;
    let session = state.reconciliations.start_session(request.into()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `GET /api/v1/reconciliations/:id`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .reconciliations
        .get_session(ReconciliationId::from_uuid(id))
        .await?;
    Ok(Json(session.into()))
}

/// `PUT /api/v1/reconciliations/:id/counts`
pub async fn record_counts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordCountsRequest>,
) -> Result<Json<RecordCountsResponse>, ApiError> {
    request.validate()?;
    let updated = state
        .reconciliations
        .record_counts(ReconciliationId::from_uuid(id), request.into_entries())
        .await?;
    Ok(Json(RecordCountsResponse { updated }))
}

/// `POST /api/v1/reconciliations/:id/finalize`
pub async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    request.validate()?;
    let session = state
        .reconciliations
        .finalize(ReconciliationId::from_uuid(id), &request.finalized_by)
        .await?;
    Ok(Json(session.into()))
}
