//! Billing domain services
//!
//! Services orchestrate the pure invoice and ledger rules against a
//! [`BillingPort`]. Each write operation runs inside one unit of work:
//! if any step fails the unit of work is dropped and nothing is kept.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use core_kernel::{InvoiceId, PaymentId};

use crate::account::AccountRef;
use crate::aging::{AgingReport, CollectionMetrics};
use crate::error::BillingError;
use crate::history::InvoiceHistoryEntry;
use crate::invoice::{Invoice, StatusChange};
use crate::ledger::{Ledger, LedgerBuilder};
use crate::payment::{receipt_number, ApplyPayment, InvoicePayment};
use crate::ports::BillingPort;

/// Read-side service for ledgers and receivable reports
#[derive(Clone)]
pub struct LedgerService {
    port: Arc<dyn BillingPort>,
}

impl LedgerService {
    pub fn new(port: Arc<dyn BillingPort>) -> Self {
        Self { port }
    }

    /// Builds the ledger for one account
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the party does not exist or does not hold an
    /// account of the requested kind.
    #[instrument(skip(self), fields(party_id = %account.party_id, kind = account.kind.as_str()))]
    pub async fn build_ledger(&self, account: AccountRef) -> Result<Ledger, BillingError> {
        self.build_ledger_as_of(account, Utc::now()).await
    }

    /// Builds the ledger with aging computed at `as_of`
    pub async fn build_ledger_as_of(
        &self,
        account: AccountRef,
        as_of: DateTime<Utc>,
    ) -> Result<Ledger, BillingError> {
        if self.port.find_account(account).await?.is_none() {
            return Err(BillingError::not_found("Account", account.party_id));
        }

        let source = self.port.load_ledger_source(account).await?;
        debug!(
            invoices = source.invoices.len(),
            payments = source.payments.len(),
            "Loaded ledger source"
        );

        LedgerBuilder::new(source).as_of(as_of).build()
    }

    /// Receivables aging, as of now unless a date is given
    #[instrument(skip(self))]
    pub async fn aging_report(&self, as_of: Option<DateTime<Utc>>) -> Result<AgingReport, BillingError> {
        let snapshot = self.port.load_receivables().await?;
        Ok(AgingReport::build(&snapshot.invoices, as_of.unwrap_or_else(Utc::now)))
    }

    /// DSO and CEI over all receivables
    #[instrument(skip(self))]
    pub async fn collection_metrics(&self) -> Result<CollectionMetrics, BillingError> {
        self.collection_metrics_as_of(Utc::now()).await
    }

    pub async fn collection_metrics_as_of(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<CollectionMetrics, BillingError> {
        let snapshot = self.port.load_receivables().await?;
        Ok(CollectionMetrics::calculate(&snapshot.invoices, &snapshot.payments, as_of))
    }
}

/// Applies payments to invoices
#[derive(Clone)]
pub struct PaymentApplicationService {
    port: Arc<dyn BillingPort>,
}

impl PaymentApplicationService {
    pub fn new(port: Arc<dyn BillingPort>) -> Self {
        Self { port }
    }

    /// Applies a payment to an invoice and returns the recorded payment
    ///
    /// This method:
    /// 1. Rejects non-positive amounts before touching the store
    /// 2. Locks the invoice and checks it against its persisted balance
    /// 3. Allocates a receipt number and records the payment
    /// 4. Updates paid amount, balance and status
    /// 5. Appends a history entry
    ///
    /// All writes commit together.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, `LockedInvoice`, `InvalidState`,
    /// `Overpayment`, or `Storage` if any write fails.
    #[instrument(skip(self, request), fields(invoice_id = %request.invoice_id, amount = %request.amount))]
    pub async fn apply_payment(&self, request: ApplyPayment) -> Result<InvoicePayment, BillingError> {
        if !request.amount.is_positive() {
            return Err(BillingError::validation("Payment amount must be positive"));
        }
        if request.recorded_by.trim().is_empty() {
            return Err(BillingError::validation("recorded_by is required"));
        }

        let mut uow = self.port.begin().await?;

        let mut invoice = uow
            .lock_invoice(request.invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Invoice", request.invoice_id))?;

        let now = Utc::now();
        let change = match invoice.apply_payment(request.amount, now) {
            Ok(change) => change,
            Err(e) => {
                warn!(error = %e, "Payment rejected");
                return Err(e);
            }
        };

        let sequence = uow.next_receipt_sequence(request.payment_date).await?;
        let payment = InvoicePayment {
            id: PaymentId::new_v7(),
            receipt_number: receipt_number(request.payment_date, sequence),
            party_id: invoice.party_id,
            account_kind: invoice.account_kind,
            invoice_id: Some(invoice.id),
            amount: request.amount,
            payment_date: request.payment_date,
            method: request.method,
            reference: request.reference,
            recorded_by: request.recorded_by,
            created_at: now,
        };

        uow.insert_payment(&payment).await?;
        uow.update_invoice(&invoice).await?;
        uow.append_history(&InvoiceHistoryEntry::payment_received(&payment, invoice.id, change))
            .await?;
        uow.commit().await?;

        info!(
            receipt = %payment.receipt_number,
            status = ?invoice.status,
            balance = %invoice.balance,
            "Payment applied"
        );
        Ok(payment)
    }
}

/// A status transition requested for an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceTransition {
    Issue,
    MarkSent,
    Cancel,
    Void,
    RefreshOverdue(NaiveDate),
}

/// Moves invoices through their non-payment lifecycle
#[derive(Clone)]
pub struct InvoiceLifecycleService {
    port: Arc<dyn BillingPort>,
}

impl InvoiceLifecycleService {
    pub fn new(port: Arc<dyn BillingPort>) -> Self {
        Self { port }
    }

    /// Applies a status transition and records it in the invoice history
    ///
    /// Returns the updated invoice. An overdue refresh that changes nothing
    /// writes nothing.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn transition(
        &self,
        invoice_id: InvoiceId,
        transition: InvoiceTransition,
        performed_by: &str,
    ) -> Result<Invoice, BillingError> {
        let mut uow = self.port.begin().await?;
        let mut invoice = uow
            .lock_invoice(invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Invoice", invoice_id))?;

        let change: Option<StatusChange> = match transition {
            InvoiceTransition::Issue => Some(invoice.issue()?),
            InvoiceTransition::MarkSent => Some(invoice.mark_sent()?),
            InvoiceTransition::Cancel => Some(invoice.cancel()?),
            InvoiceTransition::Void => Some(invoice.void()?),
            InvoiceTransition::RefreshOverdue(as_of) => invoice.refresh_overdue(as_of),
        };

        let Some(change) = change else {
            return Ok(invoice);
        };

        uow.update_invoice(&invoice).await?;
        uow.append_history(&InvoiceHistoryEntry::status_changed(invoice.id, change, performed_by))
            .await?;
        uow.commit().await?;

        info!(from = ?change.from, to = ?change.to, "Invoice status changed");
        Ok(invoice)
    }
}
