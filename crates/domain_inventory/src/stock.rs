//! Warehouses and live stock

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{StockItemId, WarehouseId};

/// Kind of stock item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockItemType {
    /// Yarn, fibre, dyes and other production inputs
    RawMaterial,
    /// Fabric and garments ready for dispatch
    FinishedGood,
}

/// Lifecycle of a raw-material lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawMaterialStatus {
    InStock,
    Reserved,
    InProduction,
    Consumed,
}

/// A warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
}

/// A live stock record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: StockItemId,
    pub item_type: StockItemType,
    pub name: String,
    pub warehouse_id: WarehouseId,
    pub quantity: Decimal,
    /// Unit of measure (kg, m, pcs)
    pub unit: String,
    /// Set for raw materials only
    pub raw_material_status: Option<RawMaterialStatus>,
}

impl StockItem {
    /// Returns true if the item is physically on the shelf and should be
    /// included in a count
    ///
    /// Finished goods always are. Raw materials only while IN_STOCK;
    /// reserved or consumed lots are accounted for elsewhere.
    pub fn is_countable(&self) -> bool {
        match self.item_type {
            StockItemType::FinishedGood => true,
            StockItemType::RawMaterial => {
                self.raw_material_status == Some(RawMaterialStatus::InStock)
            }
        }
    }
}
