//! Credit notes, debit notes and bad-debt provisions
//!
//! These adjust what a party owes without touching the invoice itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CreditNoteId, DebitNoteId, InvoiceId, Money, PartyId, ProvisionId};

use crate::account::AccountKind;

/// A credit note issued against an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: CreditNoteId,
    pub note_number: String,
    pub party_id: PartyId,
    pub account_kind: AccountKind,
    pub invoice_id: Option<InvoiceId>,
    pub amount: Money,
    pub reason: String,
    pub note_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A debit note issued against an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitNote {
    pub id: DebitNoteId,
    pub note_number: String,
    pub party_id: PartyId,
    pub account_kind: AccountKind,
    pub invoice_id: Option<InvoiceId>,
    pub amount: Money,
    pub reason: String,
    pub note_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Provision against a receivable that is unlikely to be collected
///
/// Only customers carry provisions. They are never reversed automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadDebtProvision {
    pub id: ProvisionId,
    pub customer_id: PartyId,
    pub invoice_id: Option<InvoiceId>,
    pub amount: Money,
    pub reason: String,
    pub provision_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
