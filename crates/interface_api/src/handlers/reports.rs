//! Receivable report handlers

use axum::{
    extract::{Query, State},
    Json,
};

use domain_billing::{AgingReport, CollectionMetrics};

use crate::dto::ledger::AsOfQuery;
use crate::{error::ApiError, AppState};

/// `GET /api/v1/reports/aging?as_of=`
pub async fn aging_report(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<AgingReport>, ApiError> {
    Ok(Json(state.ledgers.aging_report(query.as_of).await?))
}

/// `GET /api/v1/reports/collection-metrics?as_of=`
pub async fn collection_metrics(
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<CollectionMetrics>, ApiError> {
    let metrics = match query.as_of {
        Some(as_of) => state.ledgers.collection_metrics_as_of(as_of).await?,
        None => state.ledgers.collection_metrics().await?,
    };
    Ok(Json(metrics))
}
