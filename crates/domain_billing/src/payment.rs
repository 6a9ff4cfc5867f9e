//! Payment records
//!
//! Customer receipts and vendor payments share one shape. A payment is
//! immutable once recorded; corrections are made with credit or debit
//! notes, never by editing the payment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PartyId, PaymentId};

use crate::account::AccountKind;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    Upi,
    Card,
    Other,
}

impl PaymentMethod {
    /// Human-readable label used in ledger descriptions
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "card",
            PaymentMethod::Other => "other",
        }
    }
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayment {
    /// Unique identifier
    pub id: PaymentId,
    /// Receipt number, e.g. `RCPT-20240110-0001`
    pub receipt_number: String,
    /// Payer (receivable) or payee (payable)
    pub party_id: PartyId,
    /// Which ledger this payment belongs to
    pub account_kind: AccountKind,
    /// Invoice the payment was applied to; `None` for on-account payments
    pub invoice_id: Option<InvoiceId>,
    /// Payment amount, always positive
    pub amount: Money,
    /// Date the money moved
    pub payment_date: NaiveDate,
    /// Payment method
    pub method: PaymentMethod,
    /// External reference (bank ref, cheque number)
    pub reference: Option<String>,
    /// User who recorded the payment
    pub recorded_by: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Builds a receipt number from the payment date and the day's sequence
///
/// Sequences are zero-padded to four digits; later receipts on a busy day
/// simply grow wider.
pub fn receipt_number(date: NaiveDate, sequence: u32) -> String {
    format!("RCPT-{}-{:04}", date.format("%Y%m%d"), sequence)
}

/// Request to apply a payment to an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPayment {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
    pub recorded_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(receipt_number(date, 1), "RCPT-20240110-0001");
        assert_eq!(receipt_number(date, 42), "RCPT-20240110-0042");
        assert_eq!(receipt_number(date, 12345), "RCPT-20240110-12345");
    }

    #[test]
    fn test_receipt_numbers_sort_within_a_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut numbers: Vec<String> = (1..=12).rev().map(|n| receipt_number(date, n)).collect();
        numbers.sort();
        assert_eq!(numbers.first().unwrap(), "RCPT-20240305-0001");
        assert_eq!(numbers.last().unwrap(), "RCPT-20240305-0012");
    }

    #[test]
    fn test_method_serializes_screaming_snake() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"BANK_TRANSFER\"");
    }
}
