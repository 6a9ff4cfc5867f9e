//! Ledger construction
//!
//! A ledger merges every financial event for one account into a single
//! date-ordered list with a running balance. Building is pure: the same
//! [`LedgerSource`] always yields the same [`Ledger`].
//!
//! # Ordering
//!
//! Entries sort by date. Events on the same date sort by [`EntryKind`]
//! (invoices and debit notes before the payments and credits that settle
//! them), then by creation time, then by source id, so the order never
//! depends on how the store happened to return rows.
//!
//! # Example
//!
//! ```rust,ignore
//! let ledger = LedgerBuilder::new(source).as_of(Utc::now()).build()?;
//! assert_eq!(ledger.summary.current_balance, ledger.closing_balance());
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InvoiceId, Money};

use crate::account::{AccountKind, AccountRef, EntrySide};
use crate::aging::AgingBuckets;
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::notes::{BadDebtProvision, CreditNote, DebitNote};
use crate::payment::InvoicePayment;

/// Kind of event behind a ledger entry
///
/// Declaration order is the same-date tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Invoice,
    DebitNote,
    Payment,
    CreditNote,
    BadDebtProvision,
}

/// One line of a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    /// Document number (invoice number, receipt number, note number)
    pub reference: String,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    /// Balance after this entry
    pub running_balance: Money,
    pub related_invoice_id: Option<InvoiceId>,
    pub source_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[allow(clippy::too_many_arguments)]
    fn posted(
        account_kind: AccountKind,
        kind: EntryKind,
        amount: Money,
        date: NaiveDate,
        reference: String,
        description: String,
        related_invoice_id: Option<InvoiceId>,
        source_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (debit, credit) = match account_kind.side_for(kind)? {
            EntrySide::Debit => (amount, Money::ZERO),
            EntrySide::Credit => (Money::ZERO, amount),
        };
        Some(Self {
            date,
            kind,
            reference,
            description,
            debit,
            credit,
            running_balance: Money::ZERO,
            related_invoice_id,
            source_id,
            created_at,
        })
    }

    /// Normalizes an invoice; unposted invoices produce no entry
    pub fn from_invoice(invoice: &Invoice, account_kind: AccountKind) -> Option<Self> {
        if !invoice.status.is_posted() {
            return None;
        }
        Self::posted(
            account_kind,
            EntryKind::Invoice,
            invoice.total_amount,
            invoice.issued_at.date_naive(),
            invoice.invoice_number.clone(),
            format!("Invoice {}", invoice.invoice_number),
            Some(invoice.id),
            *invoice.id.as_uuid(),
            invoice.created_at,
        )
    }

    pub fn from_payment(payment: &InvoicePayment, account_kind: AccountKind) -> Option<Self> {
        let verb = match account_kind {
            AccountKind::Receivable => "received",
            AccountKind::Payable => "made",
        };
        Self::posted(
            account_kind,
            EntryKind::Payment,
            payment.amount,
            payment.payment_date,
            payment.receipt_number.clone(),
            format!("Payment {} via {}", verb, payment.method.label()),
            payment.invoice_id,
            *payment.id.as_uuid(),
            payment.created_at,
        )
    }

    pub fn from_credit_note(note: &CreditNote, account_kind: AccountKind) -> Option<Self> {
        Self::posted(
            account_kind,
            EntryKind::CreditNote,
            note.amount,
            note.note_date,
            note.note_number.clone(),
            note.reason.clone(),
            note.invoice_id,
            *note.id.as_uuid(),
            note.created_at,
        )
    }

    pub fn from_debit_note(note: &DebitNote, account_kind: AccountKind) -> Option<Self> {
        Self::posted(
            account_kind,
            EntryKind::DebitNote,
            note.amount,
            note.note_date,
            note.note_number.clone(),
            note.reason.clone(),
            note.invoice_id,
            *note.id.as_uuid(),
            note.created_at,
        )
    }

    /// Provisions only appear on receivable ledgers
    pub fn from_provision(provision: &BadDebtProvision, account_kind: AccountKind) -> Option<Self> {
        Self::posted(
            account_kind,
            EntryKind::BadDebtProvision,
            provision.amount,
            provision.provision_date,
            provision.id.to_string(),
            provision.reason.clone(),
            provision.invoice_id,
            *provision.id.as_uuid(),
            provision.created_at,
        )
    }

    /// Sort key implementing the same-date tie-break
    fn sort_key(&self) -> (NaiveDate, EntryKind, DateTime<Utc>, Uuid) {
        (self.date, self.kind, self.created_at, self.source_id)
    }
}

/// All events scoped to one account, as loaded from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSource {
    pub account: AccountRef,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<InvoicePayment>,
    pub credit_notes: Vec<CreditNote>,
    pub debit_notes: Vec<DebitNote>,
    pub provisions: Vec<BadDebtProvision>,
}

impl LedgerSource {
    pub fn empty(account: AccountRef) -> Self {
        Self {
            account,
            invoices: Vec::new(),
            payments: Vec::new(),
            credit_notes: Vec::new(),
            debit_notes: Vec::new(),
            provisions: Vec::new(),
        }
    }
}

/// Totals over a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_invoiced: Money,
    pub total_paid: Money,
    pub total_credit_notes: Money,
    pub total_debit_notes: Money,
    pub total_bad_debt: Money,
    /// Recomputed from the totals above
    pub current_balance: Money,
    /// Sum of open invoice balances
    pub outstanding_invoices: Money,
    pub aging: AgingBuckets,
    pub entry_count: usize,
}

/// A built ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub account: AccountRef,
    pub entries: Vec<LedgerEntry>,
    pub summary: LedgerSummary,
}

impl Ledger {
    /// Running balance after the last entry, zero for an empty ledger
    pub fn closing_balance(&self) -> Money {
        self.entries
            .last()
            .map(|e| e.running_balance)
            .unwrap_or(Money::ZERO)
    }
}

/// Builds a [`Ledger`] from a [`LedgerSource`]
#[derive(Debug, Clone)]
pub struct LedgerBuilder {
    source: LedgerSource,
    as_of: DateTime<Utc>,
}

impl LedgerBuilder {
    pub fn new(source: LedgerSource) -> Self {
        Self {
            source,
            as_of: Utc::now(),
        }
    }

    /// Reference time for aging the open invoices
    pub fn as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    /// Normalizes, orders and accumulates the entries
    ///
    /// # Errors
    ///
    /// Returns a calculation error only if the running balance overflows.
    pub fn build(self) -> Result<Ledger, BillingError> {
        let kind = self.source.account.kind;
        let source = &self.source;

        let mut entries: Vec<LedgerEntry> = source
            .invoices
            .iter()
            .filter_map(|i| LedgerEntry::from_invoice(i, kind))
            .chain(source.payments.iter().filter_map(|p| LedgerEntry::from_payment(p, kind)))
            .chain(source.credit_notes.iter().filter_map(|n| LedgerEntry::from_credit_note(n, kind)))
            .chain(source.debit_notes.iter().filter_map(|n| LedgerEntry::from_debit_note(n, kind)))
            .chain(source.provisions.iter().filter_map(|p| LedgerEntry::from_provision(p, kind)))
            .collect();

        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut running = Money::ZERO;
        for entry in &mut entries {
            let delta = kind.balance_delta(entry.debit, entry.credit);
            running = running
                .checked_add(&delta)
                .map_err(|e| BillingError::Calculation(format!("Ledger balance: {e}")))?;
            entry.running_balance = running;
        }

        let summary = self.summarize(&entries);

        Ok(Ledger {
            account: self.source.account,
            entries,
            summary,
        })
    }

    fn summarize(&self, entries: &[LedgerEntry]) -> LedgerSummary {
        let kind = self.source.account.kind;
        let total_of = |wanted: EntryKind| -> Money {
            entries
                .iter()
                .filter(|e| e.kind == wanted)
                .map(|e| e.debit + e.credit)
                .sum()
        };

        let total_invoiced = total_of(EntryKind::Invoice);
        let total_paid = total_of(EntryKind::Payment);
        let total_credit_notes = total_of(EntryKind::CreditNote);
        let total_debit_notes = total_of(EntryKind::DebitNote);
        let total_bad_debt = total_of(EntryKind::BadDebtProvision);

        let current_balance = match kind {
            AccountKind::Receivable => {
                total_invoiced + total_debit_notes - total_paid - total_credit_notes - total_bad_debt
            }
            AccountKind::Payable => {
                total_invoiced + total_credit_notes - total_paid - total_debit_notes
            }
        };

        let open: Vec<&Invoice> = self.source.invoices.iter().filter(|i| i.is_open()).collect();
        let outstanding_invoices = open.iter().map(|i| i.balance).sum();
        let aging = AgingBuckets::from_invoices(open.into_iter(), self.as_of);

        LedgerSummary {
            total_invoiced,
            total_paid,
            total_credit_notes,
            total_debit_notes,
            total_bad_debt,
            current_balance,
            outstanding_invoices,
            aging,
            entry_count: entries.len(),
        }
    }
}
