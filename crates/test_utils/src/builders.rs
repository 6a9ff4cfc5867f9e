//! Test Data Builders
//!
//! Builders for ledger documents and stock records with sensible defaults,
//! so tests only spell out the fields they care about. Party names default
//! to fake company names.

use chrono::{DateTime, NaiveDate, Utc};
use fake::faker::company::en::CompanyName;
use fake::Fake;

use core_kernel::{
    CreditNoteId, DebitNoteId, InvoiceId, Money, PartyId, PaymentId, ProvisionId, StockItemId,
    WarehouseId,
};
use domain_billing::{
    AccountKind, BadDebtProvision, CreditNote, DebitNote, Invoice, InvoicePayment, InvoiceStatus,
    PaymentMethod,
};
use domain_inventory::{RawMaterialStatus, StockItem, StockItemType};
use rust_decimal::Decimal;

use crate::fixtures::{DateFixtures, MoneyFixtures};

/// Builder for invoices
///
/// Defaults to a PENDING receivable invoice of 1000.00 issued on
/// 2024-01-01 and due 30 days later.
pub struct InvoiceBuilder {
    id: InvoiceId,
    invoice_number: String,
    party_id: PartyId,
    party_name: String,
    account_kind: AccountKind,
    issued_at: DateTime<Utc>,
    due_date: Option<NaiveDate>,
    total_amount: Money,
    paid_amount: Money,
    status: InvoiceStatus,
    created_at: Option<DateTime<Utc>>,
}

impl InvoiceBuilder {
    pub fn receivable(party_id: PartyId) -> Self {
        Self::new(party_id, AccountKind::Receivable)
    }

    pub fn payable(party_id: PartyId) -> Self {
        Self::new(party_id, AccountKind::Payable)
    }

    fn new(party_id: PartyId, account_kind: AccountKind) -> Self {
        let id = InvoiceId::new_v7();
        let suffix = id.as_uuid().simple().to_string();
        Self {
            id,
            invoice_number: format!("INV-{}", &suffix[suffix.len() - 8..]),
            party_id,
            party_name: CompanyName().fake(),
            account_kind,
            issued_at: DateFixtures::day(1, 1),
            due_date: None,
            total_amount: MoneyFixtures::invoice_total(),
            paid_amount: Money::ZERO,
            status: InvoiceStatus::Pending,
            created_at: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn with_party_name(mut self, name: impl Into<String>) -> Self {
        self.party_name = name.into();
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = total;
        self
    }

    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.issued_at = at;
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Marks `amount` as already paid, deriving status the way payment
    /// application would
    pub fn with_paid(mut self, amount: Money) -> Self {
        self.paid_amount = amount;
        self.status = if amount >= self.total_amount {
            InvoiceStatus::Paid
        } else if amount.is_positive() {
            InvoiceStatus::PartiallyPaid
        } else {
            self.status
        };
        self
    }

    pub fn build(self) -> Invoice {
        let balance = (self.total_amount - self.paid_amount).clamp_non_negative();
        let fully_paid = balance.is_zero() && self.paid_amount.is_positive();
        let created_at = self.created_at.unwrap_or(self.issued_at);
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            party_id: self.party_id,
            party_name: self.party_name,
            account_kind: self.account_kind,
            issued_at: self.issued_at,
            due_date: self
                .due_date
                .unwrap_or_else(|| (self.issued_at + chrono::Duration::days(30)).date_naive()),
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            balance,
            status: self.status,
            is_locked: fully_paid,
            paid_at: fully_paid.then_some(self.issued_at),
            created_at,
            updated_at: created_at,
        }
    }
}

/// Builder for recorded payments
pub struct PaymentBuilder {
    party_id: PartyId,
    account_kind: AccountKind,
    invoice_id: Option<InvoiceId>,
    amount: Money,
    payment_date: NaiveDate,
    method: PaymentMethod,
    sequence: u32,
}

impl PaymentBuilder {
    pub fn receivable(party_id: PartyId) -> Self {
        Self::new(party_id, AccountKind::Receivable)
    }

    pub fn payable(party_id: PartyId) -> Self {
        Self::new(party_id, AccountKind::Payable)
    }

    fn new(party_id: PartyId, account_kind: AccountKind) -> Self {
        Self {
            party_id,
            account_kind,
            invoice_id: None,
            amount: MoneyFixtures::partial_payment(),
            payment_date: DateFixtures::date(1, 10),
            method: PaymentMethod::BankTransfer,
            sequence: 1,
        }
    }

    pub fn for_invoice(mut self, invoice: &Invoice) -> Self {
        self.invoice_id = Some(invoice.id);
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.payment_date = date;
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn build(self) -> InvoicePayment {
        InvoicePayment {
            id: PaymentId::new_v7(),
            receipt_number: domain_billing::receipt_number(self.payment_date, self.sequence),
            party_id: self.party_id,
            account_kind: self.account_kind,
            invoice_id: self.invoice_id,
            amount: self.amount,
            payment_date: self.payment_date,
            method: self.method,
            reference: None,
            recorded_by: "accounts".to_string(),
            created_at: at_noon(self.payment_date),
        }
    }
}

/// Builder for credit and debit notes
pub struct NoteBuilder {
    party_id: PartyId,
    account_kind: AccountKind,
    invoice_id: Option<InvoiceId>,
    amount: Money,
    note_date: NaiveDate,
    reason: String,
}

impl NoteBuilder {
    pub fn new(party_id: PartyId, account_kind: AccountKind) -> Self {
        Self {
            party_id,
            account_kind,
            invoice_id: None,
            amount: Money::new(Decimal::new(5000, 2)),
            note_date: DateFixtures::date(1, 15),
            reason: "Shade variation".to_string(),
        }
    }

    pub fn for_invoice(mut self, invoice: &Invoice) -> Self {
        self.invoice_id = Some(invoice.id);
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.note_date = date;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn credit_note(self) -> CreditNote {
        let id = CreditNoteId::new_v7();
        CreditNote {
            id,
            note_number: format!("CN-{}", self.note_date.format("%Y%m%d")),
            party_id: self.party_id,
            account_kind: self.account_kind,
            invoice_id: self.invoice_id,
            amount: self.amount,
            reason: self.reason,
            note_date: self.note_date,
            created_at: at_noon(self.note_date),
        }
    }

    pub fn debit_note(self) -> DebitNote {
        DebitNote {
            id: DebitNoteId::new_v7(),
            note_number: format!("DN-{}", self.note_date.format("%Y%m%d")),
            party_id: self.party_id,
            account_kind: self.account_kind,
            invoice_id: self.invoice_id,
            amount: self.amount,
            reason: self.reason,
            note_date: self.note_date,
            created_at: at_noon(self.note_date),
        }
    }

    /// A bad-debt provision against the party; receivable only
    pub fn provision(self) -> BadDebtProvision {
        BadDebtProvision {
            id: ProvisionId::new_v7(),
            customer_id: self.party_id,
            invoice_id: self.invoice_id,
            amount: self.amount,
            reason: self.reason,
            provision_date: self.note_date,
            created_at: at_noon(self.note_date),
        }
    }
}

/// Builder for live stock items
pub struct StockItemBuilder {
    item: StockItem,
}

impl StockItemBuilder {
    pub fn finished_good(warehouse_id: WarehouseId, name: impl Into<String>) -> Self {
        Self {
            item: StockItem {
                id: StockItemId::new(),
                item_type: StockItemType::FinishedGood,
                name: name.into(),
                warehouse_id,
                quantity: Decimal::ZERO,
                unit: "m".to_string(),
                raw_material_status: None,
            },
        }
    }

    pub fn raw_material(warehouse_id: WarehouseId, name: impl Into<String>) -> Self {
        Self {
            item: StockItem {
                id: StockItemId::new(),
                item_type: StockItemType::RawMaterial,
                name: name.into(),
                warehouse_id,
                quantity: Decimal::ZERO,
                unit: "kg".to_string(),
                raw_material_status: Some(RawMaterialStatus::InStock),
            },
        }
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.item.quantity = quantity;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.item.unit = unit.into();
        self
    }

    pub fn status(mut self, status: RawMaterialStatus) -> Self {
        self.item.raw_material_status = Some(status);
        self
    }

    pub fn build(self) -> StockItem {
        self.item
    }
}

fn at_noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_builder_defaults() {
        let invoice = InvoiceBuilder::receivable(PartyId::new()).build();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.balance, invoice.total_amount);
        assert_eq!(invoice.due_date, DateFixtures::date(1, 31));
        assert!(!invoice.party_name.is_empty());
        assert!(!invoice.is_locked);
    }

    #[test]
    fn test_invoice_builder_paid_in_full_is_locked() {
        let invoice = InvoiceBuilder::receivable(PartyId::new())
            .with_total(Money::new(dec!(500)))
            .with_paid(Money::new(dec!(500)))
            .build();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert!(invoice.is_locked);
        assert!(invoice.paid_at.is_some());
        assert_eq!(invoice.balance, Money::ZERO);
    }

    #[test]
    fn test_payment_builder_receipt_number() {
        let payment = PaymentBuilder::receivable(PartyId::new())
            .on(DateFixtures::date(2, 3))
            .sequence(7)
            .build();
        assert_eq!(payment.receipt_number, "RCPT-20240203-0007");
    }
}
