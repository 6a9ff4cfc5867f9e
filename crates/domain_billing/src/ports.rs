//! Billing port definitions
//!
//! [`BillingPort`] is the billing domain's view of the persistent store.
//! Reads go straight through the port; writes that must commit together
//! go through a [`BillingUnitOfWork`] obtained from [`BillingPort::begin`].

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{DomainPort, InvoiceId, PortError, UnitOfWork};

use crate::account::{AccountProfile, AccountRef};
use crate::history::InvoiceHistoryEntry;
use crate::invoice::Invoice;
use crate::ledger::LedgerSource;
use crate::payment::InvoicePayment;

/// Every receivable invoice and payment, for aging and collection metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivablesSnapshot {
    pub invoices: Vec<Invoice>,
    pub payments: Vec<InvoicePayment>,
}

/// Port for billing persistence
#[async_trait]
pub trait BillingPort: DomainPort {
    /// Looks up the party behind a ledger
    async fn find_account(&self, account: AccountRef) -> Result<Option<AccountProfile>, PortError>;

    /// Loads every event belonging to one ledger
    async fn load_ledger_source(&self, account: AccountRef) -> Result<LedgerSource, PortError>;

    /// Loads all receivable invoices and payments
    async fn load_receivables(&self) -> Result<ReceivablesSnapshot, PortError>;

    /// Starts a unit of work
    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, PortError>;
}

/// Transactional billing writes
///
/// Reads made through the unit of work see its own uncommitted writes.
#[async_trait]
pub trait BillingUnitOfWork: UnitOfWork {
    /// Loads an invoice and holds it against concurrent writers until the
    /// unit of work ends
    async fn lock_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    /// Allocates the next receipt sequence for `date`, starting at 1
    async fn next_receipt_sequence(&mut self, date: NaiveDate) -> Result<u32, PortError>;

    async fn insert_payment(&mut self, payment: &InvoicePayment) -> Result<(), PortError>;

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError>;

    async fn append_history(&mut self, entry: &InvoiceHistoryEntry) -> Result<(), PortError>;
}

/// In-memory implementation of [`BillingPort`] for testing
///
/// Units of work run one at a time: `begin` takes the store's lock and
/// works on a private copy that replaces the shared state on commit.
/// Dropping an uncommitted unit of work discards the copy.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::{Mutex, OwnedMutexGuard};

    use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable, PartyId};

    use crate::account::AccountKind;
    use crate::notes::{BadDebtProvision, CreditNote, DebitNote};

    #[derive(Debug, Clone, Default)]
    struct BillingState {
        parties: HashMap<PartyId, AccountProfile>,
        invoices: HashMap<InvoiceId, Invoice>,
        payments: Vec<InvoicePayment>,
        credit_notes: Vec<CreditNote>,
        debit_notes: Vec<DebitNote>,
        provisions: Vec<BadDebtProvision>,
        history: Vec<InvoiceHistoryEntry>,
        receipt_sequences: HashMap<NaiveDate, u32>,
    }

    /// In-memory billing store
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryBillingStore {
        state: Arc<Mutex<BillingState>>,
        fail_history_writes: Arc<AtomicBool>,
    }

    impl InMemoryBillingStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent history append fail
        pub fn fail_history_writes(&self, fail: bool) {
            self.fail_history_writes.store(fail, Ordering::SeqCst);
        }

        pub async fn insert_party(&self, profile: AccountProfile) {
            self.state.lock().await.parties.insert(profile.party_id, profile);
        }

        pub async fn insert_invoice(&self, invoice: Invoice) {
            self.state.lock().await.invoices.insert(invoice.id, invoice);
        }

        pub async fn insert_payment(&self, payment: InvoicePayment) {
            self.state.lock().await.payments.push(payment);
        }

        pub async fn insert_credit_note(&self, note: CreditNote) {
            self.state.lock().await.credit_notes.push(note);
        }

        pub async fn insert_debit_note(&self, note: DebitNote) {
            self.state.lock().await.debit_notes.push(note);
        }

        pub async fn insert_provision(&self, provision: BadDebtProvision) {
            self.state.lock().await.provisions.push(provision);
        }

        /// Current committed state of an invoice
        pub async fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
            self.state.lock().await.invoices.get(&id).cloned()
        }

        /// All committed payments, in insertion order
        pub async fn payments(&self) -> Vec<InvoicePayment> {
            self.state.lock().await.payments.clone()
        }

        /// Committed history for one invoice, in insertion order
        pub async fn history(&self, invoice_id: InvoiceId) -> Vec<InvoiceHistoryEntry> {
            self.state
                .lock()
                .await
                .history
                .iter()
                .filter(|h| h.invoice_id == invoice_id)
                .cloned()
                .collect()
        }
    }

    impl DomainPort for InMemoryBillingStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryBillingStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-billing".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl BillingPort for InMemoryBillingStore {
        async fn find_account(&self, account: AccountRef) -> Result<Option<AccountProfile>, PortError> {
            Ok(self
                .state
                .lock()
                .await
                .parties
                .get(&account.party_id)
                .filter(|p| p.holds(account.kind))
                .cloned())
        }

        async fn load_ledger_source(&self, account: AccountRef) -> Result<LedgerSource, PortError> {
            let state = self.state.lock().await;
            let party = account.party_id;
            let kind = account.kind;

            Ok(LedgerSource {
                account,
                invoices: state
                    .invoices
                    .values()
                    .filter(|i| i.party_id == party && i.account_kind == kind)
                    .cloned()
                    .collect(),
                payments: state
                    .payments
                    .iter()
                    .filter(|p| p.party_id == party && p.account_kind == kind)
                    .cloned()
                    .collect(),
                credit_notes: state
                    .credit_notes
                    .iter()
                    .filter(|n| n.party_id == party && n.account_kind == kind)
                    .cloned()
                    .collect(),
                debit_notes: state
                    .debit_notes
                    .iter()
                    .filter(|n| n.party_id == party && n.account_kind == kind)
                    .cloned()
                    .collect(),
                provisions: if kind == AccountKind::Receivable {
                    state
                        .provisions
                        .iter()
                        .filter(|p| p.customer_id == party)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                },
            })
        }

        async fn load_receivables(&self) -> Result<ReceivablesSnapshot, PortError> {
            let state = self.state.lock().await;
            Ok(ReceivablesSnapshot {
                invoices: state
                    .invoices
                    .values()
                    .filter(|i| i.account_kind == AccountKind::Receivable)
                    .cloned()
                    .collect(),
                payments: state
                    .payments
                    .iter()
                    .filter(|p| p.account_kind == AccountKind::Receivable)
                    .cloned()
                    .collect(),
            })
        }

        async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            let working = guard.clone();
            Ok(Box::new(InMemoryBillingUnitOfWork {
                guard,
                working,
                fail_history_writes: self.fail_history_writes.load(Ordering::SeqCst),
            }))
        }
    }

    struct InMemoryBillingUnitOfWork {
        guard: OwnedMutexGuard<BillingState>,
        working: BillingState,
        fail_history_writes: bool,
    }

    #[async_trait]
    impl UnitOfWork for InMemoryBillingUnitOfWork {
        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            let InMemoryBillingUnitOfWork { mut guard, working, .. } = *self;
            *guard = working;
            Ok(())
        }
    }

    #[async_trait]
    impl BillingUnitOfWork for InMemoryBillingUnitOfWork {
        async fn lock_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
            Ok(self.working.invoices.get(&id).cloned())
        }

        async fn next_receipt_sequence(&mut self, date: NaiveDate) -> Result<u32, PortError> {
            let sequence = self.working.receipt_sequences.entry(date).or_insert(0);
            *sequence += 1;
            Ok(*sequence)
        }

        async fn insert_payment(&mut self, payment: &InvoicePayment) -> Result<(), PortError> {
            self.working.payments.push(payment.clone());
            Ok(())
        }

        async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
            match self.working.invoices.get_mut(&invoice.id) {
                Some(existing) => {
                    *existing = invoice.clone();
                    Ok(())
                }
                None => Err(PortError::not_found("Invoice", invoice.id)),
            }
        }

        async fn append_history(&mut self, entry: &InvoiceHistoryEntry) -> Result<(), PortError> {
            if self.fail_history_writes {
                return Err(PortError::internal("history write failed"));
            }
            self.working.history.push(entry.clone());
            Ok(())
        }
    }
}
