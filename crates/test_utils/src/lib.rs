//! Test Utilities Crate
//!
//! Shared test infrastructure for the ledger and reconciliation suites.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates, parties, warehouses and stock
//! - `builders`: Builders for invoices, payments, notes and stock items
//! - `database`: Postgres testcontainer with migrations applied
//! - `assertions`: Invariant checks for invoices, ledgers and sessions
//! - `generators`: Proptest strategies

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
