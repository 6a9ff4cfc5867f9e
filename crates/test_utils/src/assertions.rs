//! Custom Test Assertions
//!
//! Assertion helpers for ledger and reconciliation types that give more
//! meaningful failure messages than a bare `assert_eq!`.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_billing::{Invoice, InvoiceStatus, Ledger};
use domain_inventory::{ReconciliationStatus, StockReconciliation};

/// Asserts that two Money values are within `tolerance` of each other
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual,
        expected,
        diff,
        tolerance
    );
}

/// Asserts that money values sum to a total
pub fn assert_money_sum(parts: &[Money], total: &Money) {
    let sum: Money = parts.iter().sum();
    assert_eq!(
        sum, *total,
        "Money parts sum to {} but expected {}",
        sum, total
    );
}

/// Asserts the stored invoice amounts agree with each other
///
/// `balance = total - paid`, nothing is overpaid, and a PAID invoice is
/// locked with a paid timestamp.
pub fn assert_invoice_consistent(invoice: &Invoice) {
    assert_eq!(
        invoice.balance,
        invoice.total_amount - invoice.paid_amount,
        "Invoice {} balance {} != total {} - paid {}",
        invoice.invoice_number,
        invoice.balance,
        invoice.total_amount,
        invoice.paid_amount
    );
    assert!(
        invoice.paid_amount <= invoice.total_amount,
        "Invoice {} is overpaid: paid {} of {}",
        invoice.invoice_number,
        invoice.paid_amount,
        invoice.total_amount
    );
    assert!(
        !invoice.balance.is_negative(),
        "Invoice {} has negative balance {}",
        invoice.invoice_number,
        invoice.balance
    );
    if invoice.status == InvoiceStatus::Paid {
        assert!(invoice.is_locked, "Paid invoice {} is not locked", invoice.invoice_number);
        assert!(invoice.paid_at.is_some(), "Paid invoice {} has no paid_at", invoice.invoice_number);
    }
}

/// Asserts every running balance equals the previous one plus the entry's
/// signed delta, and the summary agrees with the last entry
pub fn assert_ledger_consistent(ledger: &Ledger) {
    let kind = ledger.account.kind;
    let mut running = Money::ZERO;
    for (index, entry) in ledger.entries.iter().enumerate() {
        running += kind.balance_delta(entry.debit, entry.credit);
        assert_eq!(
            entry.running_balance, running,
            "Entry {} ({}) running balance {} != recomputed {}",
            index, entry.reference, entry.running_balance, running
        );
        assert!(
            entry.debit.is_zero() || entry.credit.is_zero(),
            "Entry {} ({}) has both a debit and a credit",
            index,
            entry.reference
        );
    }
    for pair in ledger.entries.windows(2) {
        assert!(
            pair[0].date <= pair[1].date,
            "Entries out of date order: {} after {}",
            pair[1].reference,
            pair[0].reference
        );
    }
    assert_eq!(ledger.summary.entry_count, ledger.entries.len());
    assert_eq!(
        ledger.summary.current_balance,
        ledger.closing_balance(),
        "Summary balance disagrees with the last running balance"
    );
}

/// Asserts a session is completed and every counted discrepancy was logged
pub fn assert_session_finalized(session: &StockReconciliation) {
    assert_eq!(session.status, ReconciliationStatus::Completed);
    assert!(session.finalized_at.is_some(), "Completed session has no finalized_at");
    assert!(session.finalized_by.is_some(), "Completed session has no finalized_by");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::InvoiceBuilder;
    use core_kernel::PartyId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_approx_eq_within_tolerance() {
        assert_money_approx_eq(&Money::new(dec!(10.00)), &Money::new(dec!(10.01)), dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "differ by more than tolerance")]
    fn test_money_approx_eq_outside_tolerance() {
        assert_money_approx_eq(&Money::new(dec!(10.00)), &Money::new(dec!(10.05)), dec!(0.01));
    }

    #[test]
    fn test_money_sum() {
        assert_money_sum(
            &[Money::new(dec!(0.10)), Money::new(dec!(0.20))],
            &Money::new(dec!(0.30)),
        );
    }

    #[test]
    fn test_invoice_consistent_for_partial_payment() {
        let invoice = InvoiceBuilder::receivable(PartyId::new())
            .with_paid(Money::new(dec!(250)))
            .build();
        assert_invoice_consistent(&invoice);
    }

    #[test]
    #[should_panic(expected = "overpaid")]
    fn test_invoice_consistent_detects_overpayment() {
        let mut invoice = InvoiceBuilder::receivable(PartyId::new()).build();
        invoice.paid_amount = invoice.total_amount + Money::new(dec!(1));
        invoice.balance = invoice.total_amount - invoice.paid_amount;
        assert_invoice_consistent(&invoice);
    }
}
