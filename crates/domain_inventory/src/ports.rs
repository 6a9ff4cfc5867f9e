//! Inventory port definitions

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{DomainPort, PortError, ReconciliationId, StockItemId, UnitOfWork, WarehouseId};

use crate::movement::StockMovementLog;
use crate::reconciliation::{ReconciliationItem, StockReconciliation};
use crate::stock::{StockItem, Warehouse};

/// Port for inventory persistence
#[async_trait]
pub trait InventoryPort: DomainPort {
    async fn find_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, PortError>;

    /// Loads a session with its items
    async fn get_session(&self, id: ReconciliationId) -> Result<Option<StockReconciliation>, PortError>;

    /// Starts a unit of work
    async fn begin(&self) -> Result<Box<dyn InventoryUnitOfWork>, PortError>;
}

/// Transactional inventory writes
#[async_trait]
pub trait InventoryUnitOfWork: UnitOfWork {
    /// Live stock located in a warehouse
    async fn list_warehouse_stock(&mut self, warehouse_id: WarehouseId) -> Result<Vec<StockItem>, PortError>;

    /// Inserts a session together with its items
    async fn insert_session(&mut self, session: &StockReconciliation) -> Result<(), PortError>;

    /// Loads a session with its items and holds it against concurrent
    /// writers until the unit of work ends
    async fn lock_session(&mut self, id: ReconciliationId) -> Result<Option<StockReconciliation>, PortError>;

    async fn update_items(&mut self, items: &[ReconciliationItem]) -> Result<(), PortError>;

    /// Adds `delta` to a live item's quantity and returns the new quantity
    async fn adjust_stock_quantity(&mut self, item_id: StockItemId, delta: Decimal) -> Result<Decimal, PortError>;

    async fn append_movement(&mut self, movement: &StockMovementLog) -> Result<(), PortError>;

    /// Persists status and finalization fields of a session
    async fn update_session_status(&mut self, session: &StockReconciliation) -> Result<(), PortError>;
}

/// In-memory implementation of [`InventoryPort`] for testing
///
/// Units of work are serialized behind one lock and applied on commit.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::{Mutex, OwnedMutexGuard};

    use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

    #[derive(Debug, Clone, Default)]
    struct InventoryState {
        warehouses: HashMap<WarehouseId, Warehouse>,
        stock: HashMap<StockItemId, StockItem>,
        sessions: HashMap<ReconciliationId, StockReconciliation>,
        movements: Vec<StockMovementLog>,
    }

    /// In-memory inventory store
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryInventoryStore {
        state: Arc<Mutex<InventoryState>>,
        fail_movement_writes: Arc<AtomicBool>,
    }

    impl InMemoryInventoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent movement append fail
        pub fn fail_movement_writes(&self, fail: bool) {
            self.fail_movement_writes.store(fail, Ordering::SeqCst);
        }

        pub async fn insert_warehouse(&self, warehouse: Warehouse) {
            self.state.lock().await.warehouses.insert(warehouse.id, warehouse);
        }

        pub async fn insert_stock(&self, item: StockItem) {
            self.state.lock().await.stock.insert(item.id, item);
        }

        /// Changes a live quantity outside any session, as warehouse
        /// operations would
        pub async fn set_stock_quantity(&self, id: StockItemId, quantity: Decimal) {
            if let Some(item) = self.state.lock().await.stock.get_mut(&id) {
                item.quantity = quantity;
            }
        }

        pub async fn stock_item(&self, id: StockItemId) -> Option<StockItem> {
            self.state.lock().await.stock.get(&id).cloned()
        }

        pub async fn movements(&self) -> Vec<StockMovementLog> {
            self.state.lock().await.movements.clone()
        }
    }

    impl DomainPort for InMemoryInventoryStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryInventoryStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-inventory".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl InventoryPort for InMemoryInventoryStore {
        async fn find_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, PortError> {
            Ok(self.state.lock().await.warehouses.get(&id).cloned())
        }

        async fn get_session(&self, id: ReconciliationId) -> Result<Option<StockReconciliation>, PortError> {
            Ok(self.state.lock().await.sessions.get(&id).cloned())
        }

        async fn begin(&self) -> Result<Box<dyn InventoryUnitOfWork>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            let working = guard.clone();
            Ok(Box::new(InMemoryInventoryUnitOfWork {
                guard,
                working,
                fail_movement_writes: self.fail_movement_writes.load(Ordering::SeqCst),
            }))
        }
    }

    struct InMemoryInventoryUnitOfWork {
        guard: OwnedMutexGuard<InventoryState>,
        working: InventoryState,
        fail_movement_writes: bool,
    }

    #[async_trait]
    impl UnitOfWork for InMemoryInventoryUnitOfWork {
        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            let InMemoryInventoryUnitOfWork { mut guard, working, .. } = *self;
            *guard = working;
            Ok(())
        }
    }

    #[async_trait]
    impl InventoryUnitOfWork for InMemoryInventoryUnitOfWork {
        async fn list_warehouse_stock(&mut self, warehouse_id: WarehouseId) -> Result<Vec<StockItem>, PortError> {
            let mut items: Vec<StockItem> = self
                .working
                .stock
                .values()
                .filter(|s| s.warehouse_id == warehouse_id)
                .cloned()
                .collect();
            items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(items)
        }

        async fn insert_session(&mut self, session: &StockReconciliation) -> Result<(), PortError> {
            if self.working.sessions.contains_key(&session.id) {
                return Err(PortError::conflict(format!("Session {} already exists", session.id)));
            }
            self.working.sessions.insert(session.id, session.clone());
            Ok(())
        }

        async fn lock_session(&mut self, id: ReconciliationId) -> Result<Option<StockReconciliation>, PortError> {
            Ok(self.working.sessions.get(&id).cloned())
        }

        async fn update_items(&mut self, items: &[ReconciliationItem]) -> Result<(), PortError> {
            for item in items {
                let session = self
                    .working
                    .sessions
                    .get_mut(&item.reconciliation_id)
                    .ok_or_else(|| PortError::not_found("StockReconciliation", item.reconciliation_id))?;
                let existing = session
                    .items
                    .iter_mut()
                    .find(|i| i.id == item.id)
                    .ok_or_else(|| PortError::not_found("ReconciliationItem", item.id))?;
                *existing = item.clone();
            }
            Ok(())
        }

        async fn adjust_stock_quantity(&mut self, item_id: StockItemId, delta: Decimal) -> Result<Decimal, PortError> {
            let item = self
                .working
                .stock
                .get_mut(&item_id)
                .ok_or_else(|| PortError::not_found("StockItem", item_id))?;
            item.quantity += delta;
            Ok(item.quantity)
        }

        async fn append_movement(&mut self, movement: &StockMovementLog) -> Result<(), PortError> {
            if self.fail_movement_writes {
                return Err(PortError::internal("movement log write failed"));
            }
            self.working.movements.push(movement.clone());
            Ok(())
        }

        async fn update_session_status(&mut self, session: &StockReconciliation) -> Result<(), PortError> {
            let existing = self
                .working
                .sessions
                .get_mut(&session.id)
                .ok_or_else(|| PortError::not_found("StockReconciliation", session.id))?;
            existing.status = session.status;
            existing.finalized_by = session.finalized_by.clone();
            existing.finalized_at = session.finalized_at;
            Ok(())
        }
    }
}
