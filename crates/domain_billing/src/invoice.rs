//! Invoice management
//!
//! This module holds the invoice aggregate and the pure rules for applying
//! a payment to it. Persistence and locking live in the services layer;
//! everything here operates on an invoice that has already been loaded.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PartyId};

use crate::account::AccountKind;
use crate::error::BillingError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    Draft,
    /// Invoice has been issued
    Pending,
    /// Invoice has been sent to the party
    Sent,
    /// Partial payment received
    PartiallyPaid,
    /// Fully paid
    Paid,
    /// Past due date with nothing paid
    Overdue,
    /// Abandoned before posting
    Cancelled,
    /// Posted in error and voided
    Void,
}

impl InvoiceStatus {
    /// Returns true if invoices in this state appear in ledgers and totals
    pub fn is_posted(self) -> bool {
        !matches!(
            self,
            InvoiceStatus::Draft | InvoiceStatus::Cancelled | InvoiceStatus::Void
        )
    }

    /// Position along the payment progression used to check that
    /// payments never move an invoice backwards
    pub fn payment_rank(self) -> u8 {
        match self {
            InvoiceStatus::Draft => 0,
            InvoiceStatus::Pending | InvoiceStatus::Sent | InvoiceStatus::Overdue => 1,
            InvoiceStatus::PartiallyPaid => 2,
            InvoiceStatus::Paid => 3,
            InvoiceStatus::Cancelled | InvoiceStatus::Void => 4,
        }
    }
}

/// Status before and after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
}

/// An invoice raised to a customer or received from a vendor
///
/// `total_amount` is fixed once the invoice is posted. `paid_amount` only
/// grows, and `balance` is always `max(0, total_amount - paid_amount)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable)
    pub invoice_number: String,
    /// Customer or vendor
    pub party_id: PartyId,
    /// Party name as it was when the invoice was raised
    pub party_name: String,
    /// Receivable for customer invoices, payable for vendor invoices
    pub account_kind: AccountKind,
    /// Issue timestamp
    pub issued_at: DateTime<Utc>,
    /// Due date
    pub due_date: NaiveDate,
    /// Total amount
    pub total_amount: Money,
    /// Amount paid so far
    pub paid_amount: Money,
    /// Outstanding balance
    pub balance: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Set once the invoice is fully paid
    pub is_locked: bool,
    /// When the invoice became fully paid
    pub paid_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new draft invoice
    ///
    /// # Errors
    ///
    /// Returns a validation error if the total is negative or the due date
    /// precedes the issue date.
    pub fn new(
        invoice_number: impl Into<String>,
        party_id: PartyId,
        party_name: impl Into<String>,
        account_kind: AccountKind,
        total_amount: Money,
        issued_at: DateTime<Utc>,
        due_date: NaiveDate,
    ) -> Result<Self, BillingError> {
        if total_amount.is_negative() {
            return Err(BillingError::validation("Invoice total cannot be negative"));
        }
        if due_date < issued_at.date_naive() {
            return Err(BillingError::validation("Due date precedes issue date"));
        }

        let now = Utc::now();
        Ok(Self {
            id: InvoiceId::new_v7(),
            invoice_number: invoice_number.into(),
            party_id,
            party_name: party_name.into(),
            account_kind,
            issued_at,
            due_date,
            total_amount,
            paid_amount: Money::ZERO,
            balance: total_amount,
            status: InvoiceStatus::Draft,
            is_locked: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if the invoice has been posted and still has money owing
    pub fn is_open(&self) -> bool {
        self.status.is_posted() && self.balance.is_positive()
    }

    /// Issues a draft invoice
    pub fn issue(&mut self) -> Result<StatusChange, BillingError> {
        self.transition(&[InvoiceStatus::Draft], InvoiceStatus::Pending, "issue")
    }

    /// Marks an issued invoice as sent
    pub fn mark_sent(&mut self) -> Result<StatusChange, BillingError> {
        self.transition(&[InvoiceStatus::Pending], InvoiceStatus::Sent, "send")
    }

    /// Cancels an invoice that was never posted
    pub fn cancel(&mut self) -> Result<StatusChange, BillingError> {
        self.transition(&[InvoiceStatus::Draft], InvoiceStatus::Cancelled, "cancel")
    }

    /// Voids a posted invoice that has received no payments
    pub fn void(&mut self) -> Result<StatusChange, BillingError> {
        if !self.paid_amount.is_zero() {
            return Err(BillingError::InvalidState(format!(
                "Invoice {} has payments and cannot be voided",
                self.invoice_number
            )));
        }
        self.transition(
            &[InvoiceStatus::Pending, InvoiceStatus::Sent, InvoiceStatus::Overdue],
            InvoiceStatus::Void,
            "void",
        )
    }

    /// Moves an unpaid invoice to OVERDUE once its due date has passed
    ///
    /// Partially paid invoices keep their status so payment progress is
    /// never reversed. Returns `None` when nothing changed.
    pub fn refresh_overdue(&mut self, as_of: NaiveDate) -> Option<StatusChange> {
        if as_of <= self.due_date {
            return None;
        }
        match self.status {
            InvoiceStatus::Pending | InvoiceStatus::Sent => {
                let change = StatusChange { from: self.status, to: InvoiceStatus::Overdue };
                self.status = InvoiceStatus::Overdue;
                self.updated_at = Utc::now();
                Some(change)
            }
            _ => None,
        }
    }

    /// Checks whether `amount` can be applied, without changing anything
    pub fn check_payment(&self, amount: Money) -> Result<(), BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation("Payment amount must be positive"));
        }
        if self.is_locked && self.balance.is_zero() {
            return Err(BillingError::LockedInvoice(self.id));
        }
        if !self.status.is_posted() {
            return Err(BillingError::InvalidState(format!(
                "Invoice {} is {:?} and cannot accept payments",
                self.invoice_number, self.status
            )));
        }
        if amount > self.balance {
            return Err(BillingError::Overpayment {
                requested: amount,
                balance: self.balance,
            });
        }
        Ok(())
    }

    /// Applies a payment to the invoice
    ///
    /// The balance check uses the persisted `paid_amount`, never a sum of
    /// payment records. A payment that settles the balance marks the
    /// invoice PAID, stamps `paid_at` once and locks it.
    pub fn apply_payment(
        &mut self,
        amount: Money,
        at: DateTime<Utc>,
    ) -> Result<StatusChange, BillingError> {
        self.check_payment(amount)?;

        let previous = self.status;
        self.paid_amount += amount;
        self.balance = (self.total_amount - self.paid_amount).clamp_non_negative();

        if self.balance.is_zero() {
            self.status = InvoiceStatus::Paid;
            self.paid_at.get_or_insert(at);
            self.is_locked = true;
        } else if self.paid_amount.is_positive() {
            self.status = InvoiceStatus::PartiallyPaid;
        }
        self.updated_at = at;

        Ok(StatusChange { from: previous, to: self.status })
    }

    fn transition(
        &mut self,
        allowed_from: &[InvoiceStatus],
        to: InvoiceStatus,
        operation: &str,
    ) -> Result<StatusChange, BillingError> {
        if !allowed_from.contains(&self.status) {
            return Err(BillingError::InvalidState(format!(
                "Cannot {} invoice {} in status {:?}",
                operation, self.invoice_number, self.status
            )));
        }
        let change = StatusChange { from: self.status, to };
        self.status = to;
        self.updated_at = Utc::now();
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn posted_invoice(total: Money) -> Invoice {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut invoice = Invoice::new(
            "INV-2024-0001",
            PartyId::new(),
            "Arvind Mills",
            AccountKind::Receivable,
            total,
            issued,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        invoice.issue().unwrap();
        invoice
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut invoice = posted_invoice(Money::new(dec!(1000.00)));
        let at = Utc::now();

        let change = invoice.apply_payment(Money::new(dec!(400.00)), at).unwrap();
        assert_eq!(change.from, InvoiceStatus::Pending);
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(invoice.paid_amount, Money::new(dec!(400.00)));
        assert_eq!(invoice.balance, Money::new(dec!(600.00)));
        assert!(!invoice.is_locked);

        invoice.apply_payment(Money::new(dec!(600.00)), at).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.balance, Money::ZERO);
        assert_eq!(invoice.paid_at, Some(at));
        assert!(invoice.is_locked);
    }

    #[test]
    fn test_locked_invoice_rejects_payment() {
        let mut invoice = posted_invoice(Money::new(dec!(100)));
        invoice.apply_payment(Money::new(dec!(100)), Utc::now()).unwrap();
        let before = invoice.clone();

        let err = invoice.apply_payment(Money::new(dec!(1)), Utc::now()).unwrap_err();
        assert!(matches!(err, BillingError::LockedInvoice(id) if id == invoice.id));
        assert_eq!(invoice, before);
    }

    #[test]
    fn test_overpayment_rejected_without_side_effects() {
        let mut invoice = posted_invoice(Money::new(dec!(100)));
        let before = invoice.clone();
        let err = invoice.apply_payment(Money::new(dec!(100.01)), Utc::now()).unwrap_err();
        assert!(matches!(err, BillingError::Overpayment { .. }));
        assert_eq!(invoice, before);
    }

    #[test]
    fn test_non_positive_amount_is_validation_error() {
        let mut invoice = posted_invoice(Money::new(dec!(100)));
        assert!(matches!(
            invoice.apply_payment(Money::ZERO, Utc::now()),
            Err(BillingError::Validation(_))
        ));
        assert!(matches!(
            invoice.apply_payment(Money::new(dec!(-5)), Utc::now()),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_draft_and_void_reject_payment() {
        let mut draft = Invoice::new(
            "INV-D",
            PartyId::new(),
            "Draft Co",
            AccountKind::Receivable,
            Money::new(dec!(50)),
            Utc::now(),
            Utc::now().date_naive(),
        )
        .unwrap();
        assert!(matches!(
            draft.apply_payment(Money::new(dec!(10)), Utc::now()),
            Err(BillingError::InvalidState(_))
        ));

        let mut voided = posted_invoice(Money::new(dec!(50)));
        voided.void().unwrap();
        assert!(matches!(
            voided.apply_payment(Money::new(dec!(10)), Utc::now()),
            Err(BillingError::InvalidState(_))
        ));
    }

    #[test]
    fn test_paid_at_is_stamped_once() {
        let mut invoice = posted_invoice(Money::new(dec!(10)));
        let first = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        invoice.paid_at = Some(first);
        invoice.apply_payment(Money::new(dec!(10)), Utc::now()).unwrap();
        assert_eq!(invoice.paid_at, Some(first));
    }

    #[test]
    fn test_overdue_refresh() {
        let mut invoice = posted_invoice(Money::new(dec!(10)));
        let due = invoice.due_date;
        assert!(invoice.refresh_overdue(due).is_none());

        let change = invoice.refresh_overdue(due.succ_opt().unwrap()).unwrap();
        assert_eq!(change.to, InvoiceStatus::Overdue);

        // Overdue invoices can still be paid
        invoice.apply_payment(Money::new(dec!(4)), Utc::now()).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
        assert!(invoice.refresh_overdue(due.succ_opt().unwrap()).is_none());
    }

    #[test]
    fn test_void_requires_no_payments() {
        let mut invoice = posted_invoice(Money::new(dec!(10)));
        invoice.apply_payment(Money::new(dec!(1)), Utc::now()).unwrap();
        assert!(matches!(invoice.void(), Err(BillingError::InvalidState(_))));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut invoice = posted_invoice(Money::new(dec!(10)));
        assert!(invoice.issue().is_err());
        invoice.mark_sent().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert!(invoice.cancel().is_err());
    }

    #[test]
    fn test_invoice_rejects_negative_total() {
        let result = Invoice::new(
            "INV-X",
            PartyId::new(),
            "X",
            AccountKind::Payable,
            Money::new(dec!(-1)),
            Utc::now(),
            Utc::now().date_naive(),
        );
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }
}
