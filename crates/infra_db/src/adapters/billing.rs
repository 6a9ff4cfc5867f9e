//! PostgreSQL Billing Adapter
//!
//! Implements [`BillingPort`] on top of [`BillingRepository`]. Units of work
//! wrap a database transaction; invoice rows are locked with
//! `SELECT ... FOR UPDATE` so concurrent payments against one invoice
//! queue up instead of overwriting each other. Ledger and report reads run
//! in one read-only snapshot transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingAdapter;
//! use domain_billing::{BillingPort, LedgerService};
//! use std::sync::Arc;
//!
//! let port: Arc<dyn BillingPort> = Arc::new(PostgresBillingAdapter::new(pool));
//! let ledgers = LedgerService::new(port);
//! ```

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, PortError, UnitOfWork,
};
use domain_billing::{
    AccountKind, AccountProfile, AccountRef, BillingPort, BillingUnitOfWork, Invoice,
    InvoiceHistoryEntry, InvoicePayment, LedgerSource, ReceivablesSnapshot,
};

use crate::pool::begin_read_snapshot;
use crate::repositories::billing::BillingRepository;

/// PostgreSQL-backed implementation of the BillingPort trait
#[derive(Debug, Clone)]
pub struct PostgresBillingAdapter {
    pool: PgPool,
}

impl PostgresBillingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresBillingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillingAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-billing-adapter").await
    }
}

/// Runs `SELECT 1` and reports the round trip
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}

#[async_trait]
impl BillingPort for PostgresBillingAdapter {
    #[instrument(skip(self), fields(party_id = %account.party_id, kind = account.kind.as_str()))]
    async fn find_account(&self, account: AccountRef) -> Result<Option<AccountProfile>, PortError> {
        let row = BillingRepository::find_party(&self.pool, account.party_id).await?;
        Ok(row
            .map(AccountProfile::from)
            .filter(|profile| profile.holds(account.kind)))
    }

    #[instrument(skip(self), fields(party_id = %account.party_id, kind = account.kind.as_str()))]
    async fn load_ledger_source(&self, account: AccountRef) -> Result<LedgerSource, PortError> {
        let party = account.party_id;
        let kind = account.kind;

        let mut tx = begin_read_snapshot(&self.pool).await?;
        let invoices = BillingRepository::list_invoices(&mut *tx, party, kind).await?;
        let payments = BillingRepository::list_payments(&mut *tx, party, kind).await?;
        let credit_notes = BillingRepository::list_credit_notes(&mut *tx, party, kind).await?;
        let debit_notes = BillingRepository::list_debit_notes(&mut *tx, party, kind).await?;
        let provisions = match kind {
            AccountKind::Receivable => BillingRepository::list_provisions(&mut *tx, party).await?,
            AccountKind::Payable => Vec::new(),
        };
        tx.commit().await.map_err(crate::DatabaseError::from)?;

        debug!(
            invoices = invoices.len(),
            payments = payments.len(),
            credit_notes = credit_notes.len(),
            debit_notes = debit_notes.len(),
            provisions = provisions.len(),
            "Loaded ledger source"
        );

        Ok(LedgerSource {
            account,
            invoices: invoices.into_iter().map(Into::into).collect(),
            payments: payments.into_iter().map(Into::into).collect(),
            credit_notes: credit_notes.into_iter().map(Into::into).collect(),
            debit_notes: debit_notes.into_iter().map(Into::into).collect(),
            provisions: provisions.into_iter().map(Into::into).collect(),
        })
    }

    #[instrument(skip(self))]
    async fn load_receivables(&self) -> Result<ReceivablesSnapshot, PortError> {
        let mut tx = begin_read_snapshot(&self.pool).await?;
        let invoices =
            BillingRepository::list_invoices_by_kind(&mut *tx, AccountKind::Receivable).await?;
        let payments =
            BillingRepository::list_payments_by_kind(&mut *tx, AccountKind::Receivable).await?;
        tx.commit().await.map_err(crate::DatabaseError::from)?;

        Ok(ReceivablesSnapshot {
            invoices: invoices.into_iter().map(Into::into).collect(),
            payments: payments.into_iter().map(Into::into).collect(),
        })
    }

    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, PortError> {
        let tx = self.pool.begin().await.map_err(crate::DatabaseError::from)?;
        Ok(Box::new(PostgresBillingUnitOfWork { tx }))
    }
}

/// A billing unit of work bound to one database transaction
///
/// Dropping it without committing lets sqlx roll the transaction back.
pub struct PostgresBillingUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresBillingUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(crate::DatabaseError::from)?;
        Ok(())
    }
}

#[async_trait]
impl BillingUnitOfWork for PostgresBillingUnitOfWork {
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn lock_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let row = BillingRepository::lock_invoice(&mut *self.tx, id).await?;
        Ok(row.map(Invoice::from))
    }

    async fn next_receipt_sequence(&mut self, date: NaiveDate) -> Result<u32, PortError> {
        Ok(BillingRepository::next_receipt_sequence(&mut *self.tx, date).await?)
    }

    async fn insert_payment(&mut self, payment: &InvoicePayment) -> Result<(), PortError> {
        Ok(BillingRepository::insert_payment(&mut *self.tx, payment).await?)
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        Ok(BillingRepository::update_invoice(&mut *self.tx, invoice).await?)
    }

    async fn append_history(&mut self, entry: &InvoiceHistoryEntry) -> Result<(), PortError> {
        Ok(BillingRepository::insert_history(&mut *self.tx, entry).await?)
    }
}
