//! Invoice audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{HistoryEntryId, InvoiceId, Money};

use crate::invoice::{InvoiceStatus, StatusChange};
use crate::payment::InvoicePayment;

/// Kind of event recorded in an invoice's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    PaymentReceived,
    StatusChanged,
}

/// An append-only record of something that happened to an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHistoryEntry {
    pub id: HistoryEntryId,
    pub invoice_id: InvoiceId,
    pub action: HistoryAction,
    pub amount: Option<Money>,
    pub previous_status: InvoiceStatus,
    pub new_status: InvoiceStatus,
    pub description: String,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

impl InvoiceHistoryEntry {
    /// History entry for a payment applied to an invoice
    pub fn payment_received(payment: &InvoicePayment, invoice_id: InvoiceId, change: StatusChange) -> Self {
        Self {
            id: HistoryEntryId::new_v7(),
            invoice_id,
            action: HistoryAction::PaymentReceived,
            amount: Some(payment.amount),
            previous_status: change.from,
            new_status: change.to,
            description: format!(
                "Payment {} of {} received via {}",
                payment.receipt_number,
                payment.amount,
                payment.method.label()
            ),
            performed_by: payment.recorded_by.clone(),
            created_at: payment.created_at,
        }
    }

    /// History entry for a status transition not caused by a payment
    pub fn status_changed(invoice_id: InvoiceId, change: StatusChange, performed_by: impl Into<String>) -> Self {
        Self {
            id: HistoryEntryId::new_v7(),
            invoice_id,
            action: HistoryAction::StatusChanged,
            amount: None,
            previous_status: change.from,
            new_status: change.to,
            description: format!("Status changed from {:?} to {:?}", change.from, change.to),
            performed_by: performed_by.into(),
            created_at: Utc::now(),
        }
    }
}
