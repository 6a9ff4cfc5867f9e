//! Payment and invoice lifecycle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::InvoiceId;
use domain_billing::InvoicePayment;

use crate::dto::payment::{ApplyPaymentRequest, InvoiceStatusResponse, InvoiceTransitionRequest};
use crate::{error::ApiError, AppState};

/// Applies a payment to an invoice
///
/// `POST /api/v1/invoices/:id/payments`
pub async fn apply_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<ApplyPaymentRequest>,
) -> Result<(StatusCode, Json<InvoicePayment>), ApiError> {
    request.validate()?;
    let command = request.into_command(InvoiceId::from_uuid(invoice_id))?;
    let payment = state.payments.apply_payment(command).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Moves an invoice through its lifecycle
///
/// `POST /api/v1/invoices/:id/transitions`
pub async fn transition_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<InvoiceTransitionRequest>,
) -> Result<Json<InvoiceStatusResponse>, ApiError> {
    request.validate()?;
    let invoice = state
        .invoices
        .transition(
            InvoiceId::from_uuid(invoice_id),
            request.transition(),
            &request.performed_by,
        )
        .await?;
    Ok(Json(invoice.into()))
}
