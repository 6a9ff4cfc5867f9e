//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the ledger and inventory domains using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] hold the SQL and row types
//! - [`adapters`] implement the domain ports on top of the repositories,
//!   with units of work mapped onto database transactions
//! - [`pool`] creates the connection pool and runs the embedded migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/textile_erp")).await?;
//! run_migrations(&pool).await?;
//! let billing = PostgresBillingAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresBillingAdapter, PostgresInventoryAdapter};
pub use error::DatabaseError;
pub use pool::{begin_read_snapshot, create_pool, run_migrations, DatabaseConfig, DatabasePool};
