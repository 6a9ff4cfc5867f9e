//! Inventory Domain - Physical Stock Reconciliation
//!
//! This crate models warehouse stock and the reconciliation sessions that
//! compare it against physical counts:
//! - Live stock items (raw materials and finished goods) per warehouse
//! - Reconciliation sessions that snapshot system quantities and collect counts
//! - Stock movement logs written when a session's differences are applied
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_inventory::{ReconciliationService, StartReconciliation};
//!
//! let service = ReconciliationService::new(port);
//! let session = service.start_session(StartReconciliation {
//!     warehouse_id,
//!     started_by: "auditor".into(),
//!     notes: None,
//! }).await?;
//! service.record_counts(session.id, counts).await?;
//! service.finalize(session.id, "supervisor").await?;
//! ```

pub mod error;
pub mod movement;
pub mod ports;
pub mod reconciliation;
pub mod services;
pub mod stock;

pub use error::InventoryError;
pub use movement::{MovementDirection, MovementType, StockMovementLog, RECONCILIATION_REFERENCE};
pub use ports::{InventoryPort, InventoryUnitOfWork};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryInventoryStore;
pub use reconciliation::{
    CountEntry, ReconciliationItem, ReconciliationStatus, ReconciliationSummary, StockAdjustment,
    StockReconciliation, QUANTITY_SCALE,
};
pub use services::{ReconciliationService, StartReconciliation};
pub use stock::{RawMaterialStatus, StockItem, StockItemType, Warehouse};
