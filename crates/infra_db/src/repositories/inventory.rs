//! Inventory repository implementation
//!
//! Warehouses, live stock, reconciliation sessions and the movement log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use core_kernel::{
    MovementId, ReconciliationId, ReconciliationItemId, StockItemId, WarehouseId,
};
use domain_inventory::{
    MovementDirection as DomainMovementDirection, MovementType as DomainMovementType,
    RawMaterialStatus as DomainRawMaterialStatus, ReconciliationItem,
    ReconciliationStatus as DomainReconciliationStatus, StockItem,
    StockItemType as DomainStockItemType, StockMovementLog, StockReconciliation, Warehouse,
};

use crate::error::DatabaseError;

// ============================================================================
// Database enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "stock_item_type", rename_all = "snake_case")]
pub enum StockItemType {
    RawMaterial,
    FinishedGood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "raw_material_status", rename_all = "snake_case")]
pub enum RawMaterialStatus {
    InStock,
    Reserved,
    InProduction,
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "reconciliation_status", rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "movement_type", rename_all = "snake_case")]
pub enum MovementType {
    Adjustment,
    TransferIn,
    TransferOut,
    Receipt,
    Issue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "movement_direction", rename_all = "snake_case")]
pub enum MovementDirection {
    In,
    Out,
}

impl From<StockItemType> for DomainStockItemType {
    fn from(t: StockItemType) -> Self {
        match t {
            StockItemType::RawMaterial => DomainStockItemType::RawMaterial,
            StockItemType::FinishedGood => DomainStockItemType::FinishedGood,
        }
    }
}

impl From<DomainStockItemType> for StockItemType {
    fn from(t: DomainStockItemType) -> Self {
        match t {
            DomainStockItemType::RawMaterial => StockItemType::RawMaterial,
            DomainStockItemType::FinishedGood => StockItemType::FinishedGood,
        }
    }
}

impl From<RawMaterialStatus> for DomainRawMaterialStatus {
    fn from(s: RawMaterialStatus) -> Self {
        match s {
            RawMaterialStatus::InStock => DomainRawMaterialStatus::InStock,
            RawMaterialStatus::Reserved => DomainRawMaterialStatus::Reserved,
            RawMaterialStatus::InProduction => DomainRawMaterialStatus::InProduction,
            RawMaterialStatus::Consumed => DomainRawMaterialStatus::Consumed,
        }
    }
}

impl From<DomainRawMaterialStatus> for RawMaterialStatus {
    fn from(s: DomainRawMaterialStatus) -> Self {
        match s {
            DomainRawMaterialStatus::InStock => RawMaterialStatus::InStock,
            DomainRawMaterialStatus::Reserved => RawMaterialStatus::Reserved,
            DomainRawMaterialStatus::InProduction => RawMaterialStatus::InProduction,
            DomainRawMaterialStatus::Consumed => RawMaterialStatus::Consumed,
        }
    }
}

impl From<ReconciliationStatus> for DomainReconciliationStatus {
    fn from(s: ReconciliationStatus) -> Self {
        match s {
            ReconciliationStatus::Pending => DomainReconciliationStatus::Pending,
            ReconciliationStatus::Completed => DomainReconciliationStatus::Completed,
        }
    }
}

impl From<DomainReconciliationStatus> for ReconciliationStatus {
    fn from(s: DomainReconciliationStatus) -> Self {
        match s {
            DomainReconciliationStatus::Pending => ReconciliationStatus::Pending,
            DomainReconciliationStatus::Completed => ReconciliationStatus::Completed,
        }
    }
}

impl From<MovementType> for DomainMovementType {
    fn from(t: MovementType) -> Self {
        match t {
            MovementType::Adjustment => DomainMovementType::Adjustment,
            MovementType::TransferIn => DomainMovementType::TransferIn,
            MovementType::TransferOut => DomainMovementType::TransferOut,
            MovementType::Receipt => DomainMovementType::Receipt,
            MovementType::Issue => DomainMovementType::Issue,
        }
    }
}

impl From<DomainMovementType> for MovementType {
    fn from(t: DomainMovementType) -> Self {
        match t {
            DomainMovementType::Adjustment => MovementType::Adjustment,
            DomainMovementType::TransferIn => MovementType::TransferIn,
            DomainMovementType::TransferOut => MovementType::TransferOut,
            DomainMovementType::Receipt => MovementType::Receipt,
            DomainMovementType::Issue => MovementType::Issue,
        }
    }
}

impl From<MovementDirection> for DomainMovementDirection {
    fn from(d: MovementDirection) -> Self {
        match d {
            MovementDirection::In => DomainMovementDirection::In,
            MovementDirection::Out => DomainMovementDirection::Out,
        }
    }
}

impl From<DomainMovementDirection> for MovementDirection {
    fn from(d: DomainMovementDirection) -> Self {
        match d {
            DomainMovementDirection::In => MovementDirection::In,
            DomainMovementDirection::Out => MovementDirection::Out,
        }
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct WarehouseRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            id: WarehouseId::from_uuid(row.id),
            code: row.code,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StockItemRow {
    pub id: Uuid,
    pub item_type: StockItemType,
    pub name: String,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
    pub raw_material_status: Option<RawMaterialStatus>,
}

impl From<StockItemRow> for StockItem {
    fn from(row: StockItemRow) -> Self {
        StockItem {
            id: StockItemId::from_uuid(row.id),
            item_type: row.item_type.into(),
            name: row.name,
            warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
            quantity: row.quantity,
            unit: row.unit,
            raw_material_status: row.raw_material_status.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub status: ReconciliationStatus,
    pub started_by: String,
    pub started_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub finalized_by: Option<String>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    /// Assembles the aggregate from its header and line rows
    pub fn into_session(self, items: Vec<ReconciliationItemRow>) -> StockReconciliation {
        StockReconciliation {
            id: ReconciliationId::from_uuid(self.id),
            warehouse_id: WarehouseId::from_uuid(self.warehouse_id),
            status: self.status.into(),
            started_by: self.started_by,
            started_at: self.started_at,
            notes: self.notes,
            finalized_by: self.finalized_by,
            finalized_at: self.finalized_at,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ReconciliationItemRow {
    pub id: Uuid,
    pub reconciliation_id: Uuid,
    pub item_id: Uuid,
    pub item_type: StockItemType,
    pub item_name: String,
    pub unit: String,
    pub system_quantity: Decimal,
    pub physical_quantity: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub notes: Option<String>,
}

impl From<ReconciliationItemRow> for ReconciliationItem {
    fn from(row: ReconciliationItemRow) -> Self {
        ReconciliationItem {
            id: ReconciliationItemId::from_uuid(row.id),
            reconciliation_id: ReconciliationId::from_uuid(row.reconciliation_id),
            item_id: StockItemId::from_uuid(row.item_id),
            item_type: row.item_type.into(),
            item_name: row.item_name,
            unit: row.unit,
            system_quantity: row.system_quantity,
            physical_quantity: row.physical_quantity,
            difference: row.difference,
            notes: row.notes,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MovementRow {
    pub id: Uuid,
    pub movement_type: MovementType,
    pub item_id: Uuid,
    pub item_type: StockItemType,
    pub quantity: Decimal,
    pub direction: MovementDirection,
    pub warehouse_id: Uuid,
    pub performed_by: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MovementRow> for StockMovementLog {
    fn from(row: MovementRow) -> Self {
        StockMovementLog {
            id: MovementId::from_uuid(row.id),
            movement_type: row.movement_type.into(),
            item_id: StockItemId::from_uuid(row.item_id),
            item_type: row.item_type.into(),
            quantity: row.quantity,
            direction: row.direction.into(),
            warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
            performed_by: row.performed_by,
            reference_type: row.reference_type,
            reference_id: row.reference_id,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Repository for warehouse stock and reconciliation sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub async fn find_warehouse<'e, E: PgExecutor<'e>>(
        executor: E,
        id: WarehouseId,
    ) -> Result<Option<WarehouseRow>, DatabaseError> {
        let row = sqlx::query_as::<_, WarehouseRow>("SELECT id, code, name FROM warehouses WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn insert_warehouse<'e, E: PgExecutor<'e>>(
        executor: E,
        warehouse: &Warehouse,
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO warehouses (id, code, name) VALUES ($1, $2, $3)")
            .bind(*warehouse.id.as_uuid())
            .bind(&warehouse.code)
            .bind(&warehouse.name)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Live stock of a warehouse, ordered by name
    pub async fn list_warehouse_stock<'e, E: PgExecutor<'e>>(
        executor: E,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<StockItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StockItemRow>(
            r#"
            SELECT id, item_type, name, warehouse_id, quantity, unit, raw_material_status
            FROM stock_items
            WHERE warehouse_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(*warehouse_id.as_uuid())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn find_stock_item<'e, E: PgExecutor<'e>>(
        executor: E,
        id: StockItemId,
    ) -> Result<Option<StockItemRow>, DatabaseError> {
        let row = sqlx::query_as::<_, StockItemRow>(
            r#"
            SELECT id, item_type, name, warehouse_id, quantity, unit, raw_material_status
            FROM stock_items
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert_stock_item<'e, E: PgExecutor<'e>>(
        executor: E,
        item: &StockItem,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, item_type, name, warehouse_id, quantity, unit, raw_material_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(StockItemType::from(item.item_type))
        .bind(&item.name)
        .bind(*item.warehouse_id.as_uuid())
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.raw_material_status.map(RawMaterialStatus::from))
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Adds `delta` to a live quantity in place and returns the new value
    pub async fn adjust_stock_quantity<'e, E: PgExecutor<'e>>(
        executor: E,
        id: StockItemId,
        delta: Decimal,
    ) -> Result<Decimal, DatabaseError> {
        let quantity: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE stock_items
            SET quantity = quantity + $2, updated_at = now()
            WHERE id = $1
            RETURNING quantity
            "#,
        )
        .bind(*id.as_uuid())
        .bind(delta)
        .fetch_optional(executor)
        .await?;

        quantity.ok_or_else(|| DatabaseError::not_found("StockItem", id))
    }

    pub async fn find_session<'e, E: PgExecutor<'e>>(
        executor: E,
        id: ReconciliationId,
    ) -> Result<Option<SessionRow>, DatabaseError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, warehouse_id, status, started_by, started_at, notes, finalized_by, finalized_at
            FROM stock_reconciliations
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Loads a session header and locks it until the transaction ends
    pub async fn lock_session<'e, E: PgExecutor<'e>>(
        executor: E,
        id: ReconciliationId,
    ) -> Result<Option<SessionRow>, DatabaseError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, warehouse_id, status, started_by, started_at, notes, finalized_by, finalized_at
            FROM stock_reconciliations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Items of a session in the order they were snapshotted
    pub async fn list_session_items<'e, E: PgExecutor<'e>>(
        executor: E,
        id: ReconciliationId,
    ) -> Result<Vec<ReconciliationItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReconciliationItemRow>(
            r#"
            SELECT id, reconciliation_id, item_id, item_type, item_name, unit,
                   system_quantity, physical_quantity, difference, notes
            FROM reconciliation_items
            WHERE reconciliation_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn insert_session<'e, E: PgExecutor<'e>>(
        executor: E,
        session: &StockReconciliation,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO stock_reconciliations (
                id, warehouse_id, status, started_by, started_at, notes, finalized_by, finalized_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*session.id.as_uuid())
        .bind(*session.warehouse_id.as_uuid())
        .bind(ReconciliationStatus::from(session.status))
        .bind(&session.started_by)
        .bind(session.started_at)
        .bind(&session.notes)
        .bind(&session.finalized_by)
        .bind(session.finalized_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_item<'e, E: PgExecutor<'e>>(
        executor: E,
        line_no: i32,
        item: &ReconciliationItem,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_items (
                id, reconciliation_id, line_no, item_id, item_type, item_name, unit,
                system_quantity, physical_quantity, difference, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(*item.reconciliation_id.as_uuid())
        .bind(line_no)
        .bind(*item.item_id.as_uuid())
        .bind(StockItemType::from(item.item_type))
        .bind(&item.item_name)
        .bind(&item.unit)
        .bind(item.system_quantity)
        .bind(item.physical_quantity)
        .bind(item.difference)
        .bind(&item.notes)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Writes the count fields of one item
    pub async fn update_item_count<'e, E: PgExecutor<'e>>(
        executor: E,
        item: &ReconciliationItem,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE reconciliation_items
            SET physical_quantity = $2, difference = $3, notes = $4
            WHERE id = $1
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(item.physical_quantity)
        .bind(item.difference)
        .bind(&item.notes)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("ReconciliationItem", item.id));
        }
        Ok(())
    }

    pub async fn update_session_status<'e, E: PgExecutor<'e>>(
        executor: E,
        session: &StockReconciliation,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE stock_reconciliations
            SET status = $2, finalized_by = $3, finalized_at = $4
            WHERE id = $1
            "#,
        )
        .bind(*session.id.as_uuid())
        .bind(ReconciliationStatus::from(session.status))
        .bind(&session.finalized_by)
        .bind(session.finalized_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("StockReconciliation", session.id));
        }
        Ok(())
    }

    pub async fn insert_movement<'e, E: PgExecutor<'e>>(
        executor: E,
        movement: &StockMovementLog,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO stock_movement_logs (
                id, movement_type, item_id, item_type, quantity, direction, warehouse_id,
                performed_by, reference_type, reference_id, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*movement.id.as_uuid())
        .bind(MovementType::from(movement.movement_type))
        .bind(*movement.item_id.as_uuid())
        .bind(StockItemType::from(movement.item_type))
        .bind(movement.quantity)
        .bind(MovementDirection::from(movement.direction))
        .bind(*movement.warehouse_id.as_uuid())
        .bind(&movement.performed_by)
        .bind(&movement.reference_type)
        .bind(movement.reference_id)
        .bind(&movement.notes)
        .bind(movement.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Movements raised by one reference, oldest first
    pub async fn list_movements_by_reference<'e, E: PgExecutor<'e>>(
        executor: E,
        reference_type: &str,
        reference_id: Uuid,
    ) -> Result<Vec<MovementRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, movement_type, item_id, item_type, quantity, direction, warehouse_id,
                   performed_by, reference_type, reference_id, notes, created_at
            FROM stock_movement_logs
            WHERE reference_type = $1 AND reference_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
