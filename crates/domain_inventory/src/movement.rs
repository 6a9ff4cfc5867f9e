//! Stock movement log
//!
//! Every change to a live stock quantity leaves an append-only movement
//! record. Quantities are stored as a magnitude plus a direction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{MovementId, StockItemId, WarehouseId};

use crate::reconciliation::{StockAdjustment, StockReconciliation};
use crate::stock::StockItemType;

/// Reference type tagged on movements raised by a reconciliation session
pub const RECONCILIATION_REFERENCE: &str = "RECONCILIATION";

/// Why stock moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Adjustment,
    TransferIn,
    TransferOut,
    Receipt,
    Issue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    /// Direction of a signed quantity change
    pub fn of(delta: Decimal) -> Self {
        if delta < Decimal::ZERO {
            MovementDirection::Out
        } else {
            MovementDirection::In
        }
    }
}

/// An append-only record of a stock movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovementLog {
    pub id: MovementId,
    pub movement_type: MovementType,
    pub item_id: StockItemId,
    pub item_type: StockItemType,
    /// Always non-negative
    pub quantity: Decimal,
    pub direction: MovementDirection,
    pub warehouse_id: WarehouseId,
    pub performed_by: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovementLog {
    /// Movement recording one reconciliation adjustment
    pub fn reconciliation_adjustment(
        session: &StockReconciliation,
        adjustment: &StockAdjustment,
        performed_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new_v7(),
            movement_type: MovementType::Adjustment,
            item_id: adjustment.item_id,
            item_type: adjustment.item_type,
            quantity: adjustment.difference.abs(),
            direction: MovementDirection::of(adjustment.difference),
            warehouse_id: session.warehouse_id,
            performed_by: performed_by.into(),
            reference_type: Some(RECONCILIATION_REFERENCE.to_string()),
            reference_id: Some(*session.id.as_uuid()),
            notes: Some(format!(
                "Stock reconciliation adjustment for {}: {}",
                adjustment.item_name, adjustment.difference
            )),
            created_at,
        }
    }

    /// Signed quantity change this movement represents
    pub fn signed_quantity(&self) -> Decimal {
        match self.direction {
            MovementDirection::In => self.quantity,
            MovementDirection::Out => -self.quantity,
        }
    }
}
