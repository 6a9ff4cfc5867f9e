//! Account kinds and ledger polarity
//!
//! A ledger is kept per party and per side of the books. Customers owe us
//! (receivable), we owe vendors (payable). The two ledgers are mirror
//! images of each other, and [`AccountKind`] is the single place that
//! decides which side of an entry a given event lands on.

use serde::{Deserialize, Serialize};

use core_kernel::{Money, PartyId};

use crate::ledger::EntryKind;

/// Which side of the books a ledger describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    /// Money owed to us by a customer
    Receivable,
    /// Money we owe to a vendor
    Payable,
}

/// Side of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySide {
    Debit,
    Credit,
}

impl AccountKind {
    /// Returns the side an event of `kind` is posted on, or `None` if the
    /// event does not belong on this kind of ledger
    pub fn side_for(self, kind: EntryKind) -> Option<EntrySide> {
        match (self, kind) {
            (AccountKind::Receivable, EntryKind::Invoice | EntryKind::DebitNote) => {
                Some(EntrySide::Debit)
            }
            (
                AccountKind::Receivable,
                EntryKind::Payment | EntryKind::CreditNote | EntryKind::BadDebtProvision,
            ) => Some(EntrySide::Credit),
            (AccountKind::Payable, EntryKind::Invoice | EntryKind::CreditNote) => {
                Some(EntrySide::Credit)
            }
            (AccountKind::Payable, EntryKind::Payment | EntryKind::DebitNote) => {
                Some(EntrySide::Debit)
            }
            (AccountKind::Payable, EntryKind::BadDebtProvision) => None,
        }
    }

    /// Signed change to the running balance for one entry
    ///
    /// Receivable balances grow with debits, payable balances with credits.
    pub fn balance_delta(self, debit: Money, credit: Money) -> Money {
        match self {
            AccountKind::Receivable => debit - credit,
            AccountKind::Payable => credit - debit,
        }
    }

    /// Role a party must hold to own a ledger of this kind
    pub fn party_role(self) -> PartyRole {
        match self {
            AccountKind::Receivable => PartyRole::Customer,
            AccountKind::Payable => PartyRole::Vendor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Receivable => "RECEIVABLE",
            AccountKind::Payable => "PAYABLE",
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "receivable" => Ok(AccountKind::Receivable),
            "payable" => Ok(AccountKind::Payable),
            other => Err(format!("unknown account kind: {other}")),
        }
    }
}

/// Role a party plays towards us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    Customer,
    Vendor,
}

/// Identifies one ledger: a party plus the side of the books
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub party_id: PartyId,
    pub kind: AccountKind,
}

impl AccountRef {
    pub fn receivable(party_id: PartyId) -> Self {
        Self { party_id, kind: AccountKind::Receivable }
    }

    pub fn payable(party_id: PartyId) -> Self {
        Self { party_id, kind: AccountKind::Payable }
    }
}

/// The party a ledger belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub party_id: PartyId,
    pub name: String,
    pub role: PartyRole,
}

impl AccountProfile {
    /// Returns true if this party can own a ledger of `kind`
    pub fn holds(&self, kind: AccountKind) -> bool {
        self.role == kind.party_role()
    }
}
