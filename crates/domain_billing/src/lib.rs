//! Billing Domain - Receivable and Payable Ledgers
//!
//! This crate holds the financial core of the ERP: the invoice aggregate,
//! payment application, credit/debit notes and bad-debt provisions, and the
//! ledger builder that merges them into a running-balance statement.
//!
//! # Sign Conventions
//!
//! Each ledger belongs to one party on one side of the books:
//! - **Receivable** (customers): invoices and debit notes are debits;
//!   payments, credit notes and bad-debt provisions are credits
//! - **Payable** (vendors): the mirror image; vendor invoices and credit
//!   notes are credits, payments and debit notes are debits
//!
//! The running balance is always "what is owed" from the ledger's point
//! of view, so it grows with debits on receivables and with credits on
//! payables.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{ApplyPayment, PaymentApplicationService, PaymentMethod};
//!
//! let service = PaymentApplicationService::new(port);
//! let payment = service.apply_payment(ApplyPayment {
//!     invoice_id,
//!     amount: Money::new(dec!(400.00)),
//!     method: PaymentMethod::BankTransfer,
//!     payment_date,
//!     reference: None,
//!     recorded_by: "accounts".into(),
//! }).await?;
//! ```

pub mod account;
pub mod aging;
pub mod error;
pub mod history;
pub mod invoice;
pub mod ledger;
pub mod notes;
pub mod payment;
pub mod ports;
pub mod services;

pub use account::{AccountKind, AccountProfile, AccountRef, EntrySide, PartyRole};
pub use aging::{age_in_days, AccountAging, AgingBucket, AgingBuckets, AgingReport, CollectionMetrics};
pub use error::BillingError;
pub use history::{HistoryAction, InvoiceHistoryEntry};
pub use invoice::{Invoice, InvoiceStatus, StatusChange};
pub use ledger::{EntryKind, Ledger, LedgerBuilder, LedgerEntry, LedgerSource, LedgerSummary};
pub use notes::{BadDebtProvision, CreditNote, DebitNote};
pub use payment::{receipt_number, ApplyPayment, InvoicePayment, PaymentMethod};
pub use ports::{BillingPort, BillingUnitOfWork, ReceivablesSnapshot};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryBillingStore;
pub use services::{InvoiceLifecycleService, InvoiceTransition, LedgerService, PaymentApplicationService};
