//! Ledger and payment workflows against the in-memory billing store
//!
//! These tests drive the billing services end to end: seed documents,
//! apply payments, then read ledgers and reports back.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Money, PartyId};
use domain_billing::{
    AccountKind, AccountRef, ApplyPayment, BillingError, EntryKind, InMemoryBillingStore, Invoice,
    InvoiceLifecycleService, InvoiceStatus, InvoiceTransition, LedgerService,
    PaymentApplicationService, PaymentMethod,
};
use test_utils::{
    assert_invoice_consistent, assert_ledger_consistent, DateFixtures, InvoiceBuilder, NoteBuilder,
    PartyFixtures, PaymentBuilder,
};

fn payment_of(invoice: &Invoice, amount: Money) -> ApplyPayment {
    ApplyPayment {
        invoice_id: invoice.id,
        amount,
        method: PaymentMethod::BankTransfer,
        payment_date: DateFixtures::date(1, 10),
        reference: Some("NEFT-0042".to_string()),
        recorded_by: "accounts".to_string(),
    }
}

async fn store_with_invoice(total: Money) -> (Arc<InMemoryBillingStore>, Invoice) {
    let store = Arc::new(InMemoryBillingStore::new());
    let customer = PartyFixtures::customer();
    store.insert_party(customer.clone()).await;
    let invoice = InvoiceBuilder::receivable(customer.party_id)
        .with_party_name(customer.name)
        .with_total(total)
        .build();
    store.insert_invoice(invoice.clone()).await;
    (store, invoice)
}

mod ledger_building {
    use super::*;

    /// Every kind of receivable event lands on the right side and the
    /// running balance ends at invoiced + debit - paid - credit - bad debt
    #[tokio::test]
    async fn test_receivable_ledger_with_all_entry_kinds() {
        let store = Arc::new(InMemoryBillingStore::new());
        let customer = PartyFixtures::customer();
        store.insert_party(customer.clone()).await;

        let invoice = InvoiceBuilder::receivable(customer.party_id)
            .with_number("INV-0001")
            .with_total(Money::new(dec!(1000)))
            .with_paid(Money::new(dec!(400)))
            .build();
        let draft = InvoiceBuilder::receivable(customer.party_id)
            .with_number("INV-DRAFT")
            .with_status(InvoiceStatus::Draft)
            .build();
        store.insert_invoice(invoice.clone()).await;
        store.insert_invoice(draft).await;
        store
            .insert_payment(
                PaymentBuilder::receivable(customer.party_id)
                    .for_invoice(&invoice)
                    .amount(Money::new(dec!(400)))
                    .on(DateFixtures::date(1, 10))
                    .build(),
            )
            .await;
        store
            .insert_credit_note(
                NoteBuilder::new(customer.party_id, AccountKind::Receivable)
                    .amount(Money::new(dec!(50)))
                    .on(DateFixtures::date(1, 15))
                    .credit_note(),
            )
            .await;
        store
            .insert_debit_note(
                NoteBuilder::new(customer.party_id, AccountKind::Receivable)
                    .amount(Money::new(dec!(20)))
                    .on(DateFixtures::date(1, 20))
                    .reason("Freight recharge")
                    .debit_note(),
            )
            .await;
        store
            .insert_provision(
                NoteBuilder::new(customer.party_id, AccountKind::Receivable)
                    .amount(Money::new(dec!(100)))
                    .on(DateFixtures::date(2, 1))
                    .reason("Customer in liquidation")
                    .provision(),
            )
            .await;

        let service = LedgerService::new(store);
        let ledger = service
            .build_ledger_as_of(AccountRef::receivable(customer.party_id), DateFixtures::as_of())
            .await
            .unwrap();

        assert_ledger_consistent(&ledger);
        let kinds: Vec<EntryKind> = ledger.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Invoice,
                EntryKind::Payment,
                EntryKind::CreditNote,
                EntryKind::DebitNote,
                EntryKind::BadDebtProvision,
            ]
        );
        assert_eq!(ledger.summary.total_invoiced, Money::new(dec!(1000)));
        assert_eq!(ledger.summary.total_paid, Money::new(dec!(400)));
        assert_eq!(ledger.summary.total_bad_debt, Money::new(dec!(100)));
        assert_eq!(ledger.summary.current_balance, Money::new(dec!(470)));
        assert_eq!(ledger.summary.outstanding_invoices, Money::new(dec!(600)));
    }

    /// A vendor ledger is the mirror image: invoices are credits and the
    /// balance is what we owe
    #[tokio::test]
    async fn test_payable_ledger_is_mirrored() {
        let store = Arc::new(InMemoryBillingStore::new());
        let vendor = PartyFixtures::vendor();
        store.insert_party(vendor.clone()).await;

        let invoice = InvoiceBuilder::payable(vendor.party_id)
            .with_total(Money::new(dec!(2000)))
            .with_paid(Money::new(dec!(500)))
            .build();
        store.insert_invoice(invoice.clone()).await;
        store
            .insert_payment(
                PaymentBuilder::payable(vendor.party_id)
                    .for_invoice(&invoice)
                    .amount(Money::new(dec!(500)))
                    .build(),
            )
            .await;
        store
            .insert_debit_note(
                NoteBuilder::new(vendor.party_id, AccountKind::Payable)
                    .amount(Money::new(dec!(100)))
                    .reason("Short delivery of yarn")
                    .debit_note(),
            )
            .await;
        store
            .insert_credit_note(
                NoteBuilder::new(vendor.party_id, AccountKind::Payable)
                    .amount(Money::new(dec!(50)))
                    .on(DateFixtures::date(1, 25))
                    .credit_note(),
            )
            .await;

        let ledger = LedgerService::new(store)
            .build_ledger_as_of(AccountRef::payable(vendor.party_id), DateFixtures::as_of())
            .await
            .unwrap();

        assert_ledger_consistent(&ledger);
        let first = &ledger.entries[0];
        assert_eq!(first.kind, EntryKind::Invoice);
        assert_eq!(first.credit, Money::new(dec!(2000)));
        assert!(first.debit.is_zero());
        assert_eq!(ledger.summary.current_balance, Money::new(dec!(1450)));
    }

    /// Asking for a payable ledger of a customer is not found
    #[tokio::test]
    async fn test_wrong_account_kind_is_not_found() {
        let (store, _) = store_with_invoice(Money::new(dec!(100))).await;
        let err = LedgerService::new(store)
            .build_ledger(AccountRef::payable(PartyFixtures::customer().party_id))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::NotFound { .. }));
    }

    /// A party with no documents has an empty ledger
    #[tokio::test]
    async fn test_empty_ledger() {
        let store = Arc::new(InMemoryBillingStore::new());
        store.insert_party(PartyFixtures::customer()).await;
        let ledger = LedgerService::new(store)
            .build_ledger(AccountRef::receivable(PartyFixtures::customer().party_id))
            .await
            .unwrap();
        assert!(ledger.entries.is_empty());
        assert_eq!(ledger.closing_balance(), Money::ZERO);
    }
}

mod payment_application {
    use super::*;

    /// Partial then final payment: status progresses, the invoice locks,
    /// receipts are numbered per day
    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (store, invoice) = store_with_invoice(Money::new(dec!(1000))).await;
        let service = PaymentApplicationService::new(store.clone());

        let first = service
            .apply_payment(payment_of(&invoice, Money::new(dec!(400))))
            .await
            .unwrap();
        assert_eq!(first.receipt_number, "RCPT-20240110-0001");
        let after_first = store.invoice(invoice.id).await.unwrap();
        assert_eq!(after_first.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(after_first.balance, Money::new(dec!(600)));
        assert_invoice_consistent(&after_first);

        let second = service
            .apply_payment(payment_of(&invoice, Money::new(dec!(600))))
            .await
            .unwrap();
        assert_eq!(second.receipt_number, "RCPT-20240110-0002");
        let settled = store.invoice(invoice.id).await.unwrap();
        assert_eq!(settled.status, InvoiceStatus::Paid);
        assert!(settled.is_locked);
        assert_invoice_consistent(&settled);

        let err = service
            .apply_payment(payment_of(&invoice, Money::new(dec!(1))))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::LockedInvoice(_)));
        assert_eq!(store.history(invoice.id).await.len(), 2);
    }

    /// Overpayment is rejected and leaves nothing behind
    #[tokio::test]
    async fn test_overpayment_rejected() {
        let (store, invoice) = store_with_invoice(Money::new(dec!(500))).await;
        let service = PaymentApplicationService::new(store.clone());

        let err = service
            .apply_payment(payment_of(&invoice, Money::new(dec!(500.01))))
            .await
            .unwrap_err();
        match err {
            BillingError::Overpayment { requested, balance } => {
                assert_eq!(requested, Money::new(dec!(500.01)));
                assert_eq!(balance, Money::new(dec!(500)));
            }
            other => panic!("expected overpayment, got {other:?}"),
        }
        assert!(store.payments().await.is_empty());
        assert_eq!(store.invoice(invoice.id).await.unwrap(), invoice);
    }

    /// A failed history write rolls back the payment and the receipt number
    #[tokio::test]
    async fn test_failed_history_write_rolls_back() {
        let (store, invoice) = store_with_invoice(Money::new(dec!(1000))).await;
        let service = PaymentApplicationService::new(store.clone());

        store.fail_history_writes(true);
        let err = service
            .apply_payment(payment_of(&invoice, Money::new(dec!(250))))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Storage(_)));
        assert!(store.payments().await.is_empty());
        assert_eq!(store.invoice(invoice.id).await.unwrap().paid_amount, Money::ZERO);
        assert!(store.history(invoice.id).await.is_empty());

        store.fail_history_writes(false);
        let payment = service
            .apply_payment(payment_of(&invoice, Money::new(dec!(250))))
            .await
            .unwrap();
        assert_eq!(payment.receipt_number, "RCPT-20240110-0001");
    }

    /// Concurrent payments can never push paid above total
    #[tokio::test]
    async fn test_concurrent_payments_never_overpay() {
        let (store, invoice) = store_with_invoice(Money::new(dec!(1000))).await;
        let service = PaymentApplicationService::new(store.clone());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = service.clone();
                let request = payment_of(&invoice, Money::new(dec!(150)));
                tokio::spawn(async move { service.apply_payment(request).await })
            })
            .collect();

        let mut accepted = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(BillingError::Overpayment { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }

        assert_eq!(accepted, 6);
        assert_eq!(rejected, 4);
        let stored = store.invoice(invoice.id).await.unwrap();
        assert_eq!(stored.paid_amount, Money::new(dec!(900)));
        assert_invoice_consistent(&stored);

        let mut receipts: Vec<String> = store
            .payments()
            .await
            .into_iter()
            .map(|p| p.receipt_number)
            .collect();
        receipts.sort();
        receipts.dedup();
        assert_eq!(receipts.len(), 6);
    }

    /// Draft invoices cannot take payments
    #[tokio::test]
    async fn test_draft_invoice_rejects_payment() {
        let store = Arc::new(InMemoryBillingStore::new());
        let draft = InvoiceBuilder::receivable(PartyId::new())
            .with_status(InvoiceStatus::Draft)
            .build();
        store.insert_invoice(draft.clone()).await;

        let err = PaymentApplicationService::new(store)
            .apply_payment(payment_of(&draft, Money::new(dec!(10))))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidState(_)));
    }
}

mod invoice_lifecycle {
    use super::*;

    /// Draft to overdue, with every step recorded in history
    #[tokio::test]
    async fn test_issue_send_and_go_overdue() {
        let store = Arc::new(InMemoryBillingStore::new());
        let customer = PartyFixtures::customer();
        let invoice = Invoice::new(
            "INV-2024-0100",
            customer.party_id,
            customer.name.clone(),
            AccountKind::Receivable,
            Money::new(dec!(750)),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            DateFixtures::date(3, 31),
        )
        .unwrap();
        store.insert_invoice(invoice.clone()).await;
        let service = InvoiceLifecycleService::new(store.clone());

        service.transition(invoice.id, InvoiceTransition::Issue, "billing").await.unwrap();
        service.transition(invoice.id, InvoiceTransition::MarkSent, "billing").await.unwrap();

        let unchanged = service
            .transition(invoice.id, InvoiceTransition::RefreshOverdue(DateFixtures::date(3, 31)), "scheduler")
            .await
            .unwrap();
        assert_eq!(unchanged.status, InvoiceStatus::Sent);

        let overdue = service
            .transition(invoice.id, InvoiceTransition::RefreshOverdue(DateFixtures::date(4, 1)), "scheduler")
            .await
            .unwrap();
        assert_eq!(overdue.status, InvoiceStatus::Overdue);

        let history = store.history(invoice.id).await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].performed_by, "scheduler");
    }

    /// Invoices with payments cannot be voided
    #[tokio::test]
    async fn test_void_after_payment_rejected() {
        let (store, invoice) = store_with_invoice(Money::new(dec!(300))).await;
        PaymentApplicationService::new(store.clone())
            .apply_payment(payment_of(&invoice, Money::new(dec!(100))))
            .await
            .unwrap();

        let err = InvoiceLifecycleService::new(store)
            .transition(invoice.id, InvoiceTransition::Void, "billing")
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidState(_)));
    }
}

mod receivable_reports {
    use super::*;

    async fn aged_store() -> Arc<InMemoryBillingStore> {
        let store = Arc::new(InMemoryBillingStore::new());
        let customer = PartyFixtures::customer();
        store.insert_party(customer.clone()).await;
        for days in [10, 45, 75, 120] {
            store
                .insert_invoice(
                    InvoiceBuilder::receivable(customer.party_id)
                        .with_party_name(customer.name.clone())
                        .issued_at(DateFixtures::days_before_as_of(days))
                        .build(),
                )
                .await;
        }
        store
            .insert_invoice(
                InvoiceBuilder::payable(PartyFixtures::vendor().party_id)
                    .issued_at(DateFixtures::days_before_as_of(5))
                    .build(),
            )
            .await;
        store
    }

    /// One invoice per bucket; payables stay out of the report
    #[tokio::test]
    async fn test_aging_report_buckets() {
        let report = LedgerService::new(aged_store().await)
            .aging_report(Some(DateFixtures::as_of()))
            .await
            .unwrap();

        let thousand = Money::new(dec!(1000));
        assert_eq!(report.buckets.current, thousand);
        assert_eq!(report.buckets.days_31_60, thousand);
        assert_eq!(report.buckets.days_61_90, thousand);
        assert_eq!(report.buckets.over_90, thousand);
        assert_eq!(report.total_outstanding, Money::new(dec!(4000)));
        assert_eq!(report.accounts.len(), 1);
        assert_eq!(report.accounts[0].party_name, PartyFixtures::customer().name);
    }

    /// DSO and CEI over the same book after a payment
    #[tokio::test]
    async fn test_collection_metrics_after_payment() {
        let store = aged_store().await;
        let report = LedgerService::new(store.clone())
            .aging_report(Some(DateFixtures::as_of()))
            .await
            .unwrap();
        assert_eq!(report.accounts[0].total, Money::new(dec!(4000)));

        let invoices = LedgerService::new(store.clone())
            .build_ledger_as_of(
                AccountRef::receivable(PartyFixtures::customer().party_id),
                DateFixtures::as_of(),
            )
            .await
            .unwrap();
        let first_invoice = invoices.entries[0].related_invoice_id.unwrap();

        PaymentApplicationService::new(store.clone())
            .apply_payment(ApplyPayment {
                invoice_id: first_invoice,
                amount: Money::new(dec!(400)),
                method: PaymentMethod::Upi,
                payment_date: DateFixtures::date(6, 1),
                reference: None,
                recorded_by: "accounts".to_string(),
            })
            .await
            .unwrap();

        let metrics = LedgerService::new(store)
            .collection_metrics_as_of(DateFixtures::as_of())
            .await
            .unwrap();
        assert_eq!(metrics.open_receivables, Money::new(dec!(3600)));
        assert_eq!(metrics.trailing_sales, Money::new(dec!(4000)));
        assert_eq!(metrics.dso, dec!(328.50));
        assert_eq!(metrics.cei, dec!(10.00));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use test_utils::invoice_with_payments_strategy;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Whatever sequence of payments arrives, paid never exceeds total
        /// and balance always equals total minus paid
        #[test]
        fn payments_preserve_invoice_balance((total, payments) in invoice_with_payments_strategy()) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let (store, invoice) = store_with_invoice(total).await;
                let service = PaymentApplicationService::new(store.clone());
                for amount in payments {
                    let _ = service.apply_payment(payment_of(&invoice, amount)).await;
                    let stored = store.invoice(invoice.id).await.unwrap();
                    assert_invoice_consistent(&stored);
                }
                let stored = store.invoice(invoice.id).await.unwrap();
                let recorded: Money = store.payments().await.iter().map(|p| p.amount).sum();
                assert_eq!(recorded, stored.paid_amount);
            });
        }
    }
}
