//! Billing repository implementation
//!
//! Row types, PostgreSQL enum mirrors and the SQL behind the billing port.
//! Every function takes an executor so the same statement runs against the
//! pool for plain reads or against an open transaction inside a unit of work.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use core_kernel::{
    CreditNoteId, DebitNoteId, HistoryEntryId, InvoiceId, Money, PartyId, PaymentId, ProvisionId,
};
use domain_billing::{
    AccountKind as DomainAccountKind, AccountProfile, BadDebtProvision, CreditNote, DebitNote,
    HistoryAction as DomainHistoryAction, Invoice, InvoiceHistoryEntry, InvoicePayment,
    InvoiceStatus as DomainInvoiceStatus, PartyRole as DomainPartyRole,
    PaymentMethod as DomainPaymentMethod,
};

use crate::error::DatabaseError;

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, party_id, party_name, account_kind, issued_at, due_date,
    total_amount, paid_amount, balance, status, is_locked, paid_at, created_at, updated_at
"#;

const PAYMENT_COLUMNS: &str = r#"
    id, receipt_number, party_id, account_kind, invoice_id, amount, payment_date,
    method, reference, recorded_by, created_at
"#;

const NOTE_COLUMNS: &str = r#"
    id, note_number, party_id, account_kind, invoice_id, amount, reason, note_date, created_at
"#;

// ============================================================================
// Database enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "party_role", rename_all = "snake_case")]
pub enum PartyRole {
    Customer,
    Vendor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_kind", rename_all = "snake_case")]
pub enum AccountKind {
    Receivable,
    Payable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    Upi,
    Card,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "history_action", rename_all = "snake_case")]
pub enum HistoryAction {
    PaymentReceived,
    StatusChanged,
}

impl From<PartyRole> for DomainPartyRole {
    fn from(role: PartyRole) -> Self {
        match role {
            PartyRole::Customer => DomainPartyRole::Customer,
            PartyRole::Vendor => DomainPartyRole::Vendor,
        }
    }
}

impl From<DomainPartyRole> for PartyRole {
    fn from(role: DomainPartyRole) -> Self {
        match role {
            DomainPartyRole::Customer => PartyRole::Customer,
            DomainPartyRole::Vendor => PartyRole::Vendor,
        }
    }
}

impl From<AccountKind> for DomainAccountKind {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Receivable => DomainAccountKind::Receivable,
            AccountKind::Payable => DomainAccountKind::Payable,
        }
    }
}

impl From<DomainAccountKind> for AccountKind {
    fn from(kind: DomainAccountKind) -> Self {
        match kind {
            DomainAccountKind::Receivable => AccountKind::Receivable,
            DomainAccountKind::Payable => AccountKind::Payable,
        }
    }
}

impl From<InvoiceStatus> for DomainInvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Draft => DomainInvoiceStatus::Draft,
            InvoiceStatus::Pending => DomainInvoiceStatus::Pending,
            InvoiceStatus::Sent => DomainInvoiceStatus::Sent,
            InvoiceStatus::PartiallyPaid => DomainInvoiceStatus::PartiallyPaid,
            InvoiceStatus::Paid => DomainInvoiceStatus::Paid,
            InvoiceStatus::Overdue => DomainInvoiceStatus::Overdue,
            InvoiceStatus::Cancelled => DomainInvoiceStatus::Cancelled,
            InvoiceStatus::Void => DomainInvoiceStatus::Void,
        }
    }
}

impl From<DomainInvoiceStatus> for InvoiceStatus {
    fn from(status: DomainInvoiceStatus) -> Self {
        match status {
            DomainInvoiceStatus::Draft => InvoiceStatus::Draft,
            DomainInvoiceStatus::Pending => InvoiceStatus::Pending,
            DomainInvoiceStatus::Sent => InvoiceStatus::Sent,
            DomainInvoiceStatus::PartiallyPaid => InvoiceStatus::PartiallyPaid,
            DomainInvoiceStatus::Paid => InvoiceStatus::Paid,
            DomainInvoiceStatus::Overdue => InvoiceStatus::Overdue,
            DomainInvoiceStatus::Cancelled => InvoiceStatus::Cancelled,
            DomainInvoiceStatus::Void => InvoiceStatus::Void,
        }
    }
}

impl From<PaymentMethod> for DomainPaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => DomainPaymentMethod::Cash,
            PaymentMethod::BankTransfer => DomainPaymentMethod::BankTransfer,
            PaymentMethod::Cheque => DomainPaymentMethod::Cheque,
            PaymentMethod::Upi => DomainPaymentMethod::Upi,
            PaymentMethod::Card => DomainPaymentMethod::Card,
            PaymentMethod::Other => DomainPaymentMethod::Other,
        }
    }
}

impl From<DomainPaymentMethod> for PaymentMethod {
    fn from(method: DomainPaymentMethod) -> Self {
        match method {
            DomainPaymentMethod::Cash => PaymentMethod::Cash,
            DomainPaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
            DomainPaymentMethod::Cheque => PaymentMethod::Cheque,
            DomainPaymentMethod::Upi => PaymentMethod::Upi,
            DomainPaymentMethod::Card => PaymentMethod::Card,
            DomainPaymentMethod::Other => PaymentMethod::Other,
        }
    }
}

impl From<HistoryAction> for DomainHistoryAction {
    fn from(action: HistoryAction) -> Self {
        match action {
            HistoryAction::PaymentReceived => DomainHistoryAction::PaymentReceived,
            HistoryAction::StatusChanged => DomainHistoryAction::StatusChanged,
        }
    }
}

impl From<DomainHistoryAction> for HistoryAction {
    fn from(action: DomainHistoryAction) -> Self {
        match action {
            DomainHistoryAction::PaymentReceived => HistoryAction::PaymentReceived,
            DomainHistoryAction::StatusChanged => HistoryAction::StatusChanged,
        }
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct PartyRow {
    pub id: Uuid,
    pub name: String,
    pub role: PartyRole,
}

impl From<PartyRow> for AccountProfile {
    fn from(row: PartyRow) -> Self {
        AccountProfile {
            party_id: PartyId::from_uuid(row.id),
            name: row.name,
            role: row.role.into(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub party_id: Uuid,
    pub party_name: String,
    pub account_kind: AccountKind,
    pub issued_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: InvoiceStatus,
    pub is_locked: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::from_uuid(row.id),
            invoice_number: row.invoice_number,
            party_id: PartyId::from_uuid(row.party_id),
            party_name: row.party_name,
            account_kind: row.account_kind.into(),
            issued_at: row.issued_at,
            due_date: row.due_date,
            total_amount: Money::new(row.total_amount),
            paid_amount: Money::new(row.paid_amount),
            balance: Money::new(row.balance),
            status: row.status.into(),
            is_locked: row.is_locked,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub receipt_number: String,
    pub party_id: Uuid,
    pub account_kind: AccountKind,
    pub invoice_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for InvoicePayment {
    fn from(row: PaymentRow) -> Self {
        InvoicePayment {
            id: PaymentId::from_uuid(row.id),
            receipt_number: row.receipt_number,
            party_id: PartyId::from_uuid(row.party_id),
            account_kind: row.account_kind.into(),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            amount: Money::new(row.amount),
            payment_date: row.payment_date,
            method: row.method.into(),
            reference: row.reference,
            recorded_by: row.recorded_by,
            created_at: row.created_at,
        }
    }
}

/// Shared shape of `credit_notes` and `debit_notes`
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub note_number: String,
    pub party_id: Uuid,
    pub account_kind: AccountKind,
    pub invoice_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: String,
    pub note_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<NoteRow> for CreditNote {
    fn from(row: NoteRow) -> Self {
        CreditNote {
            id: CreditNoteId::from_uuid(row.id),
            note_number: row.note_number,
            party_id: PartyId::from_uuid(row.party_id),
            account_kind: row.account_kind.into(),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            amount: Money::new(row.amount),
            reason: row.reason,
            note_date: row.note_date,
            created_at: row.created_at,
        }
    }
}

impl From<NoteRow> for DebitNote {
    fn from(row: NoteRow) -> Self {
        DebitNote {
            id: DebitNoteId::from_uuid(row.id),
            note_number: row.note_number,
            party_id: PartyId::from_uuid(row.party_id),
            account_kind: row.account_kind.into(),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            amount: Money::new(row.amount),
            reason: row.reason,
            note_date: row.note_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProvisionRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: String,
    pub provision_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<ProvisionRow> for BadDebtProvision {
    fn from(row: ProvisionRow) -> Self {
        BadDebtProvision {
            id: ProvisionId::from_uuid(row.id),
            customer_id: PartyId::from_uuid(row.customer_id),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            amount: Money::new(row.amount),
            reason: row.reason,
            provision_date: row.provision_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub action: HistoryAction,
    pub amount: Option<Decimal>,
    pub previous_status: InvoiceStatus,
    pub new_status: InvoiceStatus,
    pub description: String,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Queries
// ============================================================================

/// Repository for the receivable and payable ledgers
///
/// Stateless; each method runs on whatever executor it is handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingRepository;

impl BillingRepository {
    pub async fn find_party<'e, E: PgExecutor<'e>>(
        executor: E,
        party_id: PartyId,
    ) -> Result<Option<PartyRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PartyRow>("SELECT id, name, role FROM parties WHERE id = $1")
            .bind(*party_id.as_uuid())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn insert_party<'e, E: PgExecutor<'e>>(
        executor: E,
        profile: &AccountProfile,
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO parties (id, name, role) VALUES ($1, $2, $3)")
            .bind(*profile.party_id.as_uuid())
            .bind(&profile.name)
            .bind(PartyRole::from(profile.role))
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Invoices of one ledger
    pub async fn list_invoices<'e, E: PgExecutor<'e>>(
        executor: E,
        party_id: PartyId,
        kind: DomainAccountKind,
    ) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE party_id = $1 AND account_kind = $2"
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(*party_id.as_uuid())
            .bind(AccountKind::from(kind))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Every invoice on one side of the books
    pub async fn list_invoices_by_kind<'e, E: PgExecutor<'e>>(
        executor: E,
        kind: DomainAccountKind,
    ) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE account_kind = $1");
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(AccountKind::from(kind))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Loads an invoice and takes a row lock held until the transaction ends
    pub async fn lock_invoice<'e, E: PgExecutor<'e>>(
        executor: E,
        id: InvoiceId,
    ) -> Result<Option<InvoiceRow>, DatabaseError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn insert_invoice<'e, E: PgExecutor<'e>>(
        executor: E,
        invoice: &Invoice,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, party_id, party_name, account_kind, issued_at, due_date,
                total_amount, paid_amount, balance, status, is_locked, paid_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(*invoice.id.as_uuid())
        .bind(&invoice.invoice_number)
        .bind(*invoice.party_id.as_uuid())
        .bind(&invoice.party_name)
        .bind(AccountKind::from(invoice.account_kind))
        .bind(invoice.issued_at)
        .bind(invoice.due_date)
        .bind(invoice.total_amount.amount())
        .bind(invoice.paid_amount.amount())
        .bind(invoice.balance.amount())
        .bind(InvoiceStatus::from(invoice.status))
        .bind(invoice.is_locked)
        .bind(invoice.paid_at)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Writes the mutable part of an invoice
    pub async fn update_invoice<'e, E: PgExecutor<'e>>(
        executor: E,
        invoice: &Invoice,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET paid_amount = $2, balance = $3, status = $4, is_locked = $5,
                paid_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(*invoice.id.as_uuid())
        .bind(invoice.paid_amount.amount())
        .bind(invoice.balance.amount())
        .bind(InvoiceStatus::from(invoice.status))
        .bind(invoice.is_locked)
        .bind(invoice.paid_at)
        .bind(invoice.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", invoice.id));
        }
        Ok(())
    }

    pub async fn list_payments<'e, E: PgExecutor<'e>>(
        executor: E,
        party_id: PartyId,
        kind: DomainAccountKind,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM invoice_payments WHERE party_id = $1 AND account_kind = $2"
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(*party_id.as_uuid())
            .bind(AccountKind::from(kind))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn list_payments_by_kind<'e, E: PgExecutor<'e>>(
        executor: E,
        kind: DomainAccountKind,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM invoice_payments WHERE account_kind = $1");
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(AccountKind::from(kind))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn insert_payment<'e, E: PgExecutor<'e>>(
        executor: E,
        payment: &InvoicePayment,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoice_payments (
                id, receipt_number, party_id, account_kind, invoice_id, amount,
                payment_date, method, reference, recorded_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*payment.id.as_uuid())
        .bind(&payment.receipt_number)
        .bind(*payment.party_id.as_uuid())
        .bind(AccountKind::from(payment.account_kind))
        .bind(payment.invoice_id.map(Uuid::from))
        .bind(payment.amount.amount())
        .bind(payment.payment_date)
        .bind(PaymentMethod::from(payment.method))
        .bind(&payment.reference)
        .bind(&payment.recorded_by)
        .bind(payment.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Allocates the next receipt number for a day
    ///
    /// The upsert locks the day's row, so concurrent allocations queue
    /// behind each other and a rolled back transaction gives its number back.
    pub async fn next_receipt_sequence<'e, E: PgExecutor<'e>>(
        executor: E,
        date: NaiveDate,
    ) -> Result<u32, DatabaseError> {
        let value: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO receipt_sequences (sequence_date, last_value)
            VALUES ($1, 1)
            ON CONFLICT (sequence_date)
            DO UPDATE SET last_value = receipt_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(date)
        .fetch_one(executor)
        .await?;

        u32::try_from(value).map_err(|_| {
            DatabaseError::DecodeFailed(format!("receipt sequence out of range: {}", value))
        })
    }

    pub async fn list_credit_notes<'e, E: PgExecutor<'e>>(
        executor: E,
        party_id: PartyId,
        kind: DomainAccountKind,
    ) -> Result<Vec<NoteRow>, DatabaseError> {
        Self::list_notes(executor, "credit_notes", party_id, kind).await
    }

    pub async fn list_debit_notes<'e, E: PgExecutor<'e>>(
        executor: E,
        party_id: PartyId,
        kind: DomainAccountKind,
    ) -> Result<Vec<NoteRow>, DatabaseError> {
        Self::list_notes(executor, "debit_notes", party_id, kind).await
    }

    async fn list_notes<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &'static str,
        party_id: PartyId,
        kind: DomainAccountKind,
    ) -> Result<Vec<NoteRow>, DatabaseError> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM {table} WHERE party_id = $1 AND account_kind = $2"
        );
        let rows = sqlx::query_as::<_, NoteRow>(&sql)
            .bind(*party_id.as_uuid())
            .bind(AccountKind::from(kind))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn insert_credit_note<'e, E: PgExecutor<'e>>(
        executor: E,
        note: &CreditNote,
    ) -> Result<(), DatabaseError> {
        Self::insert_note(
            executor,
            "credit_notes",
            *note.id.as_uuid(),
            &note.note_number,
            note.party_id,
            note.account_kind,
            note.invoice_id,
            note.amount,
            &note.reason,
            note.note_date,
            note.created_at,
        )
        .await
    }

    pub async fn insert_debit_note<'e, E: PgExecutor<'e>>(
        executor: E,
        note: &DebitNote,
    ) -> Result<(), DatabaseError> {
        Self::insert_note(
            executor,
            "debit_notes",
            *note.id.as_uuid(),
            &note.note_number,
            note.party_id,
            note.account_kind,
            note.invoice_id,
            note.amount,
            &note.reason,
            note.note_date,
            note.created_at,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_note<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &'static str,
        id: Uuid,
        note_number: &str,
        party_id: PartyId,
        kind: DomainAccountKind,
        invoice_id: Option<InvoiceId>,
        amount: Money,
        reason: &str,
        note_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {table} ({NOTE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(note_number)
            .bind(*party_id.as_uuid())
            .bind(AccountKind::from(kind))
            .bind(invoice_id.map(Uuid::from))
            .bind(amount.amount())
            .bind(reason)
            .bind(note_date)
            .bind(created_at)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_provisions<'e, E: PgExecutor<'e>>(
        executor: E,
        customer_id: PartyId,
    ) -> Result<Vec<ProvisionRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProvisionRow>(
            r#"
            SELECT id, customer_id, invoice_id, amount, reason, provision_date, created_at
            FROM bad_debt_provisions
            WHERE customer_id = $1
            "#,
        )
        .bind(*customer_id.as_uuid())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn insert_provision<'e, E: PgExecutor<'e>>(
        executor: E,
        provision: &BadDebtProvision,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO bad_debt_provisions (
                id, customer_id, invoice_id, amount, reason, provision_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*provision.id.as_uuid())
        .bind(*provision.customer_id.as_uuid())
        .bind(provision.invoice_id.map(Uuid::from))
        .bind(provision.amount.amount())
        .bind(&provision.reason)
        .bind(provision.provision_date)
        .bind(provision.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_history<'e, E: PgExecutor<'e>>(
        executor: E,
        entry: &InvoiceHistoryEntry,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoice_history (
                id, invoice_id, action, amount, previous_status, new_status,
                description, performed_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*entry.id.as_uuid())
        .bind(*entry.invoice_id.as_uuid())
        .bind(HistoryAction::from(entry.action))
        .bind(entry.amount.map(Decimal::from))
        .bind(InvoiceStatus::from(entry.previous_status))
        .bind(InvoiceStatus::from(entry.new_status))
        .bind(&entry.description)
        .bind(&entry.performed_by)
        .bind(entry.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// History rows of one invoice, oldest first
    pub async fn list_history<'e, E: PgExecutor<'e>>(
        executor: E,
        invoice_id: InvoiceId,
    ) -> Result<Vec<HistoryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, invoice_id, action, amount, previous_status, new_status,
                   description, performed_by, created_at
            FROM invoice_history
            WHERE invoice_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(*invoice_id.as_uuid())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}

impl From<HistoryRow> for InvoiceHistoryEntry {
    fn from(row: HistoryRow) -> Self {
        InvoiceHistoryEntry {
            id: HistoryEntryId::from_uuid(row.id),
            invoice_id: InvoiceId::from_uuid(row.invoice_id),
            action: row.action.into(),
            amount: row.amount.map(Money::new),
            previous_status: row.previous_status.into(),
            new_status: row.new_status.into(),
            description: row.description,
            performed_by: row.performed_by,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_status_mapping_is_lossless() {
        let all = [
            DomainInvoiceStatus::Draft,
            DomainInvoiceStatus::Pending,
            DomainInvoiceStatus::Sent,
            DomainInvoiceStatus::PartiallyPaid,
            DomainInvoiceStatus::Paid,
            DomainInvoiceStatus::Overdue,
            DomainInvoiceStatus::Cancelled,
            DomainInvoiceStatus::Void,
        ];
        for status in all {
            let db: InvoiceStatus = status.into();
            assert_eq!(DomainInvoiceStatus::from(db), status);
        }
    }

    #[test]
    fn test_invoice_row_conversion() {
        let now = Utc::now();
        let row = InvoiceRow {
            id: Uuid::new_v4(),
            invoice_number: "INV-0001".to_string(),
            party_id: Uuid::new_v4(),
            party_name: "Sunrise Mills".to_string(),
            account_kind: AccountKind::Receivable,
            issued_at: now,
            due_date: now.date_naive(),
            total_amount: dec!(1000),
            paid_amount: dec!(400),
            balance: dec!(600),
            status: InvoiceStatus::PartiallyPaid,
            is_locked: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };

        let invoice = Invoice::from(row.clone());
        assert_eq!(*invoice.id.as_uuid(), row.id);
        assert_eq!(invoice.account_kind, DomainAccountKind::Receivable);
        assert_eq!(invoice.status, DomainInvoiceStatus::PartiallyPaid);
        assert_eq!(invoice.balance, Money::new(dec!(600.00)));
    }

    #[test]
    fn test_note_row_converts_to_both_note_kinds() {
        let row = NoteRow {
            id: Uuid::new_v4(),
            note_number: "CN-7".to_string(),
            party_id: Uuid::new_v4(),
            account_kind: AccountKind::Payable,
            invoice_id: None,
            amount: dec!(50),
            reason: "short delivery".to_string(),
            note_date: Utc::now().date_naive(),
            created_at: Utc::now(),
        };

        let credit = CreditNote::from(row.clone());
        let debit = DebitNote::from(row);
        assert_eq!(credit.amount, debit.amount);
        assert_eq!(credit.account_kind, DomainAccountKind::Payable);
    }
}
