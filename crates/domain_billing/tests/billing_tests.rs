//! Integration tests for domain_billing

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CreditNoteId, DebitNoteId, InvoiceId, Money, PartyId, PaymentId};

use domain_billing::{
    AccountKind, AccountRef, AgingBucket, AgingReport, BillingError, CollectionMetrics, CreditNote,
    DebitNote, EntryKind, Invoice, InvoicePayment, InvoiceStatus, LedgerBuilder, LedgerSource,
    PaymentMethod,
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

fn posted_invoice(party: PartyId, name: &str, total: Money, issued: DateTime<Utc>) -> Invoice {
    let mut invoice = Invoice::new(
        format!("INV-{}", issued.format("%Y%m%d")),
        party,
        name,
        AccountKind::Receivable,
        total,
        issued,
        (issued + Duration::days(30)).date_naive(),
    )
    .unwrap();
    invoice.issue().unwrap();
    invoice.created_at = issued;
    invoice
}

fn payment(party: PartyId, invoice_id: Option<InvoiceId>, amount: Money, date: DateTime<Utc>) -> InvoicePayment {
    InvoicePayment {
        id: PaymentId::new_v7(),
        receipt_number: format!("RCPT-{}-0001", date.format("%Y%m%d")),
        party_id: party,
        account_kind: AccountKind::Receivable,
        invoice_id,
        amount,
        payment_date: date.date_naive(),
        method: PaymentMethod::Cheque,
        reference: None,
        recorded_by: "tester".to_string(),
        created_at: date,
    }
}

// ============================================================================
// Payment Application Tests
// ============================================================================

mod payment_application_tests {
    use super::*;

    #[test]
    fn test_partial_then_full_payment_scenario() {
        let mut invoice = posted_invoice(PartyId::new(), "Raymond", Money::new(dec!(1000.00)), at(2024, 1, 1));

        invoice.apply_payment(Money::new(dec!(400.00)), Utc::now()).unwrap();
        assert_eq!(invoice.paid_amount, Money::new(dec!(400.00)));
        assert_eq!(invoice.balance, Money::new(dec!(600.00)));
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);

        invoice.apply_payment(Money::new(dec!(600.00)), Utc::now()).unwrap();
        assert_eq!(invoice.paid_amount, Money::new(dec!(1000.00)));
        assert_eq!(invoice.balance, Money::ZERO);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_paid_invoice_is_locked_scenario() {
        let mut invoice = posted_invoice(PartyId::new(), "Raymond", Money::new(dec!(1000.00)), at(2024, 1, 1));
        invoice.apply_payment(Money::new(dec!(1000.00)), Utc::now()).unwrap();
        let before = invoice.clone();

        let err = invoice.apply_payment(Money::new(dec!(1.00)), Utc::now()).unwrap_err();
        assert!(matches!(err, BillingError::LockedInvoice(_)));
        assert_eq!(invoice, before);
    }
}

// ============================================================================
// Ledger Tests
// ============================================================================

mod ledger_tests {
    use super::*;

    fn customer_source() -> LedgerSource {
        let party = PartyId::new();
        let mut source = LedgerSource::empty(AccountRef::receivable(party));
        let invoice = posted_invoice(party, "Vardhman", Money::new(dec!(1000)), at(2024, 1, 1));
        source.payments.push(payment(party, Some(invoice.id), Money::new(dec!(300)), at(2024, 1, 10)));
        source.credit_notes.push(CreditNote {
            id: CreditNoteId::new_v7(),
            note_number: "CN-0001".to_string(),
            party_id: party,
            account_kind: AccountKind::Receivable,
            invoice_id: Some(invoice.id),
            amount: Money::new(dec!(50)),
            reason: "Short shipment".to_string(),
            note_date: at(2024, 1, 12).date_naive(),
            created_at: at(2024, 1, 12),
        });
        source.debit_notes.push(DebitNote {
            id: DebitNoteId::new_v7(),
            note_number: "DN-0001".to_string(),
            party_id: party,
            account_kind: AccountKind::Receivable,
            invoice_id: None,
            amount: Money::new(dec!(20)),
            reason: "Freight recharge".to_string(),
            note_date: at(2024, 1, 12).date_naive(),
            created_at: at(2024, 1, 12),
        });
        source.invoices.push(invoice);
        source
    }

    #[test]
    fn test_customer_ledger_scenario() {
        let party = PartyId::new();
        let mut source = LedgerSource::empty(AccountRef::receivable(party));
        source.invoices.push(posted_invoice(party, "Arvind", Money::new(dec!(1000)), at(2024, 1, 1)));
        source.payments.push(payment(party, None, Money::new(dec!(300)), at(2024, 1, 10)));

        let ledger = LedgerBuilder::new(source).build().unwrap();

        let kinds: Vec<EntryKind> = ledger.entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Invoice, EntryKind::Payment]);
        assert_eq!(ledger.entries[0].debit, Money::new(dec!(1000)));
        assert_eq!(ledger.entries[0].running_balance, Money::new(dec!(1000)));
        assert_eq!(ledger.entries[1].credit, Money::new(dec!(300)));
        assert_eq!(ledger.entries[1].running_balance, Money::new(dec!(700)));
        assert_eq!(ledger.summary.total_invoiced, Money::new(dec!(1000)));
        assert_eq!(ledger.summary.total_paid, Money::new(dec!(300)));
        assert_eq!(ledger.summary.current_balance, Money::new(dec!(700)));
    }

    #[test]
    fn test_notes_and_tie_break_on_same_date() {
        let ledger = LedgerBuilder::new(customer_source()).build().unwrap();

        let kinds: Vec<EntryKind> = ledger.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::Invoice, EntryKind::Payment, EntryKind::DebitNote, EntryKind::CreditNote]
        );
        assert_eq!(ledger.summary.total_debit_notes, Money::new(dec!(20)));
        assert_eq!(ledger.summary.total_credit_notes, Money::new(dec!(50)));
        assert_eq!(ledger.summary.current_balance, Money::new(dec!(670)));
        assert_eq!(ledger.summary.current_balance, ledger.closing_balance());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let source = customer_source();
        let as_of = at(2024, 2, 1);
        let first = LedgerBuilder::new(source.clone()).as_of(as_of).build().unwrap();
        let second = LedgerBuilder::new(source).as_of(as_of).build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_order_does_not_change_output() {
        let mut source = customer_source();
        let party = source.account.party_id;
        let day = at(2024, 1, 20);
        source.payments.push(payment(party, None, Money::new(dec!(10)), day));
        source.payments.push(payment(party, None, Money::new(dec!(20)), day));
        source.invoices.push(posted_invoice(party, "Vardhman", Money::new(dec!(5)), day));

        let mut shuffled = source.clone();
        shuffled.payments.reverse();
        shuffled.invoices.reverse();

        let as_of = at(2024, 2, 1);
        assert_eq!(
            LedgerBuilder::new(source).as_of(as_of).build().unwrap().entries,
            LedgerBuilder::new(shuffled).as_of(as_of).build().unwrap().entries
        );
    }

    #[test]
    fn test_summary_includes_aging_of_open_invoices() {
        let party = PartyId::new();
        let mut source = LedgerSource::empty(AccountRef::receivable(party));
        source.invoices.push(posted_invoice(party, "Trident", Money::new(dec!(100)), at(2024, 1, 1)));
        source.invoices.push(posted_invoice(party, "Trident", Money::new(dec!(200)), at(2024, 3, 1)));

        let ledger = LedgerBuilder::new(source).as_of(at(2024, 3, 15)).build().unwrap();
        assert_eq!(ledger.summary.outstanding_invoices, Money::new(dec!(300)));
        assert_eq!(ledger.summary.aging.get(AgingBucket::Current), Money::new(dec!(200)));
        assert_eq!(ledger.summary.aging.get(AgingBucket::Days61To90), Money::new(dec!(100)));
    }
}

// ============================================================================
// Aging & Metrics Tests
// ============================================================================

mod metrics_tests {
    use super::*;

    #[test]
    fn test_aging_report_groups_per_account() {
        let alpha = PartyId::new();
        let beta = PartyId::new();
        let as_of = at(2024, 6, 30);
        let mut paid = posted_invoice(beta, "Beta Fabrics", Money::new(dec!(75)), at(2024, 6, 1));
        paid.apply_payment(Money::new(dec!(75)), as_of).unwrap();

        let invoices = vec![
            posted_invoice(alpha, "Alpha Yarns", Money::new(dec!(100)), at(2024, 6, 20)),
            posted_invoice(alpha, "Alpha Yarns", Money::new(dec!(40)), at(2024, 1, 2)),
            posted_invoice(beta, "Beta Fabrics", Money::new(dec!(60)), at(2024, 5, 1)),
            paid,
        ];

        let report = AgingReport::build(&invoices, as_of);
        assert_eq!(report.total_outstanding, Money::new(dec!(200)));
        assert_eq!(report.buckets.current, Money::new(dec!(100)));
        assert_eq!(report.buckets.days_31_60, Money::new(dec!(60)));
        assert_eq!(report.buckets.over_90, Money::new(dec!(40)));

        assert_eq!(report.accounts.len(), 2);
        assert_eq!(report.accounts[0].party_name, "Alpha Yarns");
        assert_eq!(report.accounts[0].total, Money::new(dec!(140)));
        assert_eq!(report.accounts[1].total, Money::new(dec!(60)));
    }

    #[test]
    fn test_collection_metrics() {
        let party = PartyId::new();
        let as_of = at(2024, 12, 31);
        let mut first = posted_invoice(party, "Gamma", Money::new(dec!(1000)), at(2024, 3, 1));
        first.apply_payment(Money::new(dec!(1000)), as_of).unwrap();
        let second = posted_invoice(party, "Gamma", Money::new(dec!(500)), at(2024, 11, 1));

        let payments = vec![payment(party, Some(first.id), Money::new(dec!(1000)), at(2024, 4, 1))];
        let metrics = CollectionMetrics::calculate(&[first, second], &payments, as_of);

        // 500 / 1500 * 365
        assert_eq!(metrics.dso, dec!(121.67));
        // 1000 / 1500 * 100
        assert_eq!(metrics.cei, dec!(66.67));
        assert_eq!(metrics.open_receivables, Money::new(dec!(500)));
    }

    #[test]
    fn test_dso_is_zero_without_recent_sales() {
        let party = PartyId::new();
        let old = posted_invoice(party, "Delta", Money::new(dec!(100)), at(2020, 1, 1));
        let metrics = CollectionMetrics::calculate(&[old], &[], at(2024, 1, 1));
        assert_eq!(metrics.dso, Decimal::ZERO);
        assert_eq!(metrics.cei, Decimal::ZERO);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn balance_invariant_holds_for_any_payment_sequence(
        total in 1i64..10_000_000i64,
        attempts in prop::collection::vec(1i64..5_000_000i64, 1..20)
    ) {
        let total = Money::from_minor(total);
        let mut invoice = posted_invoice(PartyId::new(), "Prop", total, at(2024, 1, 1));
        let mut applied = Money::ZERO;
        let mut last_rank = invoice.status.payment_rank();

        for minor in attempts {
            let amount = Money::from_minor(minor);
            let before = invoice.clone();
            match invoice.apply_payment(amount, Utc::now()) {
                Ok(_) => applied += amount,
                Err(BillingError::Overpayment { .. }) | Err(BillingError::LockedInvoice(_)) => {
                    prop_assert_eq!(&invoice, &before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }

            prop_assert_eq!(invoice.balance, (invoice.total_amount - invoice.paid_amount).clamp_non_negative());
            prop_assert!(invoice.paid_amount <= invoice.total_amount);
            prop_assert_eq!(invoice.paid_amount, applied);

            let rank = invoice.status.payment_rank();
            prop_assert!(rank >= last_rank);
            last_rank = rank;
        }
    }

    #[test]
    fn ledger_running_balance_matches_summary(
        invoice_amounts in prop::collection::vec(1i64..1_000_000i64, 0..8),
        payment_amounts in prop::collection::vec(1i64..1_000_000i64, 0..8),
        day_offsets in prop::collection::vec(0i64..60, 16)
    ) {
        let party = PartyId::new();
        let start = at(2024, 1, 1);
        let mut source = LedgerSource::empty(AccountRef::receivable(party));
        for (i, minor) in invoice_amounts.iter().enumerate() {
            source.invoices.push(posted_invoice(party, "P", Money::from_minor(*minor), start + Duration::days(day_offsets[i])));
        }
        for (i, minor) in payment_amounts.iter().enumerate() {
            source.payments.push(payment(party, None, Money::from_minor(*minor), start + Duration::days(day_offsets[8 + i])));
        }

        let ledger = LedgerBuilder::new(source).build().unwrap();
        prop_assert_eq!(ledger.summary.current_balance, ledger.closing_balance());

        let dates: Vec<NaiveDate> = ledger.entries.iter().map(|e| e.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        prop_assert_eq!(dates, sorted);
    }
}
