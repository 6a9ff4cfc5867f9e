//! PostgreSQL Inventory Adapter
//!
//! Implements [`InventoryPort`] on top of [`InventoryRepository`]. A session
//! is locked through its header row, so two finalizations of the same
//! session run one after the other and the second sees it completed.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, PortError, ReconciliationId, StockItemId,
    UnitOfWork, WarehouseId,
};
use domain_inventory::{
    InventoryPort, InventoryUnitOfWork, ReconciliationItem, StockItem, StockMovementLog,
    StockReconciliation, Warehouse,
};

use crate::adapters::billing::ping;
use crate::pool::begin_read_snapshot;
use crate::repositories::inventory::InventoryRepository;

/// PostgreSQL-backed implementation of the InventoryPort trait
#[derive(Debug, Clone)]
pub struct PostgresInventoryAdapter {
    pool: PgPool,
}

impl PostgresInventoryAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresInventoryAdapter {}

#[async_trait]
impl HealthCheckable for PostgresInventoryAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-inventory-adapter").await
    }
}

#[async_trait]
impl InventoryPort for PostgresInventoryAdapter {
    #[instrument(skip(self), fields(warehouse_id = %id))]
    async fn find_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>, PortError> {
        let row = InventoryRepository::find_warehouse(&self.pool, id).await?;
        Ok(row.map(Warehouse::from))
    }

    #[instrument(skip(self), fields(reconciliation_id = %id))]
    async fn get_session(&self, id: ReconciliationId) -> Result<Option<StockReconciliation>, PortError> {
        let mut tx = begin_read_snapshot(&self.pool).await?;
        let Some(header) = InventoryRepository::find_session(&mut *tx, id).await? else {
            return Ok(None);
        };
        let items = InventoryRepository::list_session_items(&mut *tx, id).await?;
        tx.commit().await.map_err(crate::DatabaseError::from)?;
        Ok(Some(header.into_session(items)))
    }

    async fn begin(&self) -> Result<Box<dyn InventoryUnitOfWork>, PortError> {
        let tx = self.pool.begin().await.map_err(crate::DatabaseError::from)?;
        Ok(Box::new(PostgresInventoryUnitOfWork { tx }))
    }
}

/// An inventory unit of work bound to one database transaction
pub struct PostgresInventoryUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresInventoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(crate::DatabaseError::from)?;
        Ok(())
    }
}

#[async_trait]
impl InventoryUnitOfWork for PostgresInventoryUnitOfWork {
    async fn list_warehouse_stock(&mut self, warehouse_id: WarehouseId) -> Result<Vec<StockItem>, PortError> {
        let rows = InventoryRepository::list_warehouse_stock(&mut *self.tx, warehouse_id).await?;
        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    #[instrument(skip(self, session), fields(reconciliation_id = %session.id, items = session.items.len()))]
    async fn insert_session(&mut self, session: &StockReconciliation) -> Result<(), PortError> {
        InventoryRepository::insert_session(&mut *self.tx, session).await?;
        for (line_no, item) in session.items.iter().enumerate() {
            let line_no = i32::try_from(line_no)
                .map_err(|_| PortError::validation("too many items in one session"))?;
            InventoryRepository::insert_item(&mut *self.tx, line_no, item).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(reconciliation_id = %id))]
    async fn lock_session(&mut self, id: ReconciliationId) -> Result<Option<StockReconciliation>, PortError> {
        let Some(header) = InventoryRepository::lock_session(&mut *self.tx, id).await? else {
            return Ok(None);
        };
        let items = InventoryRepository::list_session_items(&mut *self.tx, id).await?;
        Ok(Some(header.into_session(items)))
    }

    async fn update_items(&mut self, items: &[ReconciliationItem]) -> Result<(), PortError> {
        for item in items {
            InventoryRepository::update_item_count(&mut *self.tx, item).await?;
        }
        debug!(count = items.len(), "Updated reconciliation items");
        Ok(())
    }

    async fn adjust_stock_quantity(&mut self, item_id: StockItemId, delta: Decimal) -> Result<Decimal, PortError> {
        Ok(InventoryRepository::adjust_stock_quantity(&mut *self.tx, item_id, delta).await?)
    }

    async fn append_movement(&mut self, movement: &StockMovementLog) -> Result<(), PortError> {
        Ok(InventoryRepository::insert_movement(&mut *self.tx, movement).await?)
    }

    async fn update_session_status(&mut self, session: &StockReconciliation) -> Result<(), PortError> {
        Ok(InventoryRepository::update_session_status(&mut *self.tx, session).await?)
    }
}
