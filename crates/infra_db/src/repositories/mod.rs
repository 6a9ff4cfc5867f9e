//! Repository implementations for domain entities
//!
//! Repositories own the SQL. They map between database rows and domain
//! types and accept any executor, so adapters can run them on the pool or
//! inside a unit of work's transaction.

pub mod billing;
pub mod inventory;

pub use billing::BillingRepository;
pub use inventory::InventoryRepository;
