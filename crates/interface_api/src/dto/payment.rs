//! Payment and invoice lifecycle DTOs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{InvoiceId, Money};
use domain_billing::{ApplyPayment, Invoice, InvoiceStatus, InvoiceTransition, PaymentMethod};

use crate::error::ApiError;

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("amount must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyPaymentRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Defaults to today (UTC)
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 120))]
    pub reference: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub recorded_by: String,
}

impl ApplyPaymentRequest {
    /// Converts into the service command, rejecting sub-paisa amounts
    pub fn into_command(self, invoice_id: InvoiceId) -> Result<ApplyPayment, ApiError> {
        let amount = Money::try_new(self.amount).map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(ApplyPayment {
            invoice_id,
            amount,
            method: self.method,
            payment_date: self.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            reference: self.reference,
            recorded_by: self.recorded_by,
        })
    }
}

/// Lifecycle actions exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceAction {
    Issue,
    MarkSent,
    Cancel,
    Void,
    RefreshOverdue,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceTransitionRequest {
    pub action: InvoiceAction,
    /// Reference date for REFRESH_OVERDUE, defaults to today (UTC)
    pub as_of: Option<NaiveDate>,
    #[validate(length(min = 1, max = 120))]
    pub performed_by: String,
}

impl InvoiceTransitionRequest {
    pub fn transition(&self) -> InvoiceTransition {
        match self.action {
            InvoiceAction::Issue => InvoiceTransition::Issue,
            InvoiceAction::MarkSent => InvoiceTransition::MarkSent,
            InvoiceAction::Cancel => InvoiceTransition::Cancel,
            InvoiceAction::Void => InvoiceTransition::Void,
            InvoiceAction::RefreshOverdue => InvoiceTransition::RefreshOverdue(
                self.as_of.unwrap_or_else(|| Utc::now().date_naive()),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceStatusResponse {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub balance: Money,
    pub is_locked: bool,
}

impl From<Invoice> for InvoiceStatusResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            status: invoice.status,
            total_amount: invoice.total_amount,
            paid_amount: invoice.paid_amount,
            balance: invoice.balance,
            is_locked: invoice.is_locked,
        }
    }
}
