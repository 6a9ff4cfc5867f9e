//! Ledger handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use core_kernel::PartyId;
use domain_billing::{AccountKind, AccountRef, Ledger};

use crate::dto::ledger::AsOfQuery;
use crate::{error::ApiError, AppState};

/// Builds the ledger of one party
///
/// `GET /api/v1/ledgers/{receivable|payable}/:party_id?as_of=`
pub async fn get_ledger(
    State(state): State<AppState>,
    Path((kind, party_id)): Path<(String, Uuid)>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<Ledger>, ApiError> {
    let kind: AccountKind = kind.parse().map_err(ApiError::BadRequest)?;
    let account = AccountRef {
        party_id: PartyId::from_uuid(party_id),
        kind,
    };

    let ledger = match query.as_of {
        Some(as_of) => state.ledgers.build_ledger_as_of(account, as_of).await?,
        None => state.ledgers.build_ledger(account).await?,
    };
    Ok(Json(ledger))
}
