//! Domain Adapters
//!
//! Implementations of the domain ports backed by PostgreSQL. Each adapter
//! translates between domain models and the row types in
//! [`crate::repositories`] and maps database errors to `PortError`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresBillingAdapter, PostgresInventoryAdapter};
//!
//! let billing = PostgresBillingAdapter::new(pool.clone());
//! let inventory = PostgresInventoryAdapter::new(pool);
//! ```

pub mod billing;
pub mod inventory;

pub use billing::{PostgresBillingAdapter, PostgresBillingUnitOfWork};
pub use inventory::{PostgresInventoryAdapter, PostgresInventoryUnitOfWork};
