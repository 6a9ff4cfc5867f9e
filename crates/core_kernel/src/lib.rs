//! Core Kernel - Foundational types shared by the ledger and inventory domains
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money with exact two-place decimal arithmetic
//! - Strongly-typed identifiers
//! - Port and unit-of-work abstractions for storage adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, MoneyError, MONEY_SCALE};
pub use identifiers::{
    PartyId, InvoiceId, PaymentId, CreditNoteId, DebitNoteId, ProvisionId,
    HistoryEntryId, WarehouseId, StockItemId, ReconciliationId,
    ReconciliationItemId, MovementId,
};
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError, UnitOfWork,
};
