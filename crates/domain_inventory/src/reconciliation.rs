//! Stock reconciliation sessions
//!
//! A session freezes the system quantity of every countable item in a
//! warehouse, collects physical counts over time, and on finalization
//! turns the differences into stock adjustments.
//!
//! Differences are always measured against the frozen snapshot, so stock
//! that moves while the count is in progress is not reported as a
//! discrepancy.
//!
//! # State Machine
//!
//! ```text
//! PENDING ──finalize──> COMPLETED
//! ```
//!
//! COMPLETED is terminal. Sessions cannot be cancelled or reopened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ReconciliationId, ReconciliationItemId, StockItemId, WarehouseId};

use crate::error::InventoryError;
use crate::stock::{StockItem, StockItemType};

/// Decimal places stored for stock and count quantities
pub const QUANTITY_SCALE: u32 = 4;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    Pending,
    Completed,
}

/// One item being counted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationItem {
    pub id: ReconciliationItemId,
    pub reconciliation_id: ReconciliationId,
    pub item_id: StockItemId,
    pub item_type: StockItemType,
    /// Item name at snapshot time
    pub item_name: String,
    pub unit: String,
    /// Quantity on record when the session started
    pub system_quantity: Decimal,
    /// `None` until counted
    pub physical_quantity: Option<Decimal>,
    /// `physical_quantity - system_quantity`, `None` until counted
    pub difference: Option<Decimal>,
    pub notes: Option<String>,
}

impl ReconciliationItem {
    /// Snapshots a live stock item
    pub fn snapshot(reconciliation_id: ReconciliationId, stock: &StockItem) -> Self {
        Self {
            id: ReconciliationItemId::new_v7(),
            reconciliation_id,
            item_id: stock.id,
            item_type: stock.item_type,
            item_name: stock.name.clone(),
            unit: stock.unit.clone(),
            system_quantity: stock.quantity,
            physical_quantity: None,
            difference: None,
            notes: None,
        }
    }

    /// Records a physical count, replacing any earlier count
    pub fn record_count(&mut self, physical_quantity: Decimal, notes: Option<String>) {
        self.physical_quantity = Some(physical_quantity);
        self.difference = Some(physical_quantity - self.system_quantity);
        if notes.is_some() {
            self.notes = notes;
        }
    }

    pub fn is_counted(&self) -> bool {
        self.physical_quantity.is_some()
    }

    /// The signed change to apply to live stock, if any
    pub fn pending_adjustment(&self) -> Option<Decimal> {
        self.difference.filter(|d| !d.is_zero())
    }
}

/// A physical count submitted for one session item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
    pub item_id: ReconciliationItemId,
    pub physical_quantity: Decimal,
    pub notes: Option<String>,
}

/// An adjustment produced by finalizing a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub reconciliation_item_id: ReconciliationItemId,
    pub item_id: StockItemId,
    pub item_type: StockItemType,
    pub item_name: String,
    /// Signed change to the live quantity
    pub difference: Decimal,
}

/// Counts over a session's items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_items: usize,
    pub counted_items: usize,
    pub uncounted_items: usize,
    pub discrepant_items: usize,
    /// Sum of differences over counted items
    pub net_difference: Decimal,
}

/// A reconciliation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReconciliation {
    pub id: ReconciliationId,
    pub warehouse_id: WarehouseId,
    pub status: ReconciliationStatus,
    pub started_by: String,
    pub started_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub finalized_by: Option<String>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub items: Vec<ReconciliationItem>,
}

impl StockReconciliation {
    /// Opens a session over the countable items in `stock`
    ///
    /// Items belonging to other warehouses and raw materials that are not
    /// in stock are skipped.
    pub fn start(
        warehouse_id: WarehouseId,
        started_by: impl Into<String>,
        notes: Option<String>,
        stock: &[StockItem],
        started_at: DateTime<Utc>,
    ) -> Self {
        let id = ReconciliationId::new_v7();
        let items = stock
            .iter()
            .filter(|s| s.warehouse_id == warehouse_id && s.is_countable())
            .map(|s| ReconciliationItem::snapshot(id, s))
            .collect();

        Self {
            id,
            warehouse_id,
            status: ReconciliationStatus::Pending,
            started_by: started_by.into(),
            started_at,
            notes,
            finalized_by: None,
            finalized_at: None,
            items,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReconciliationStatus::Pending
    }

    /// Checks a batch of counts without applying it
    pub fn validate_counts(counts: &[CountEntry]) -> Result<(), InventoryError> {
        if counts.is_empty() {
            return Err(InventoryError::validation("At least one count is required"));
        }
        if let Some(bad) = counts.iter().find(|c| c.physical_quantity < Decimal::ZERO) {
            return Err(InventoryError::validation(format!(
                "Physical quantity for {} cannot be negative",
                bad.item_id
            )));
        }
        if let Some(fine) = counts
            .iter()
            .find(|c| c.physical_quantity.normalize().scale() > QUANTITY_SCALE)
        {
            return Err(InventoryError::validation(format!(
                "Physical quantity {} for {} has more than {} decimal places",
                fine.physical_quantity, fine.item_id, QUANTITY_SCALE
            )));
        }
        Ok(())
    }

    /// Records physical counts and returns the updated items
    ///
    /// The whole batch is rejected if any entry is invalid or refers to an
    /// item outside this session. Recording the same count twice yields the
    /// same difference.
    pub fn record_counts(
        &mut self,
        counts: &[CountEntry],
    ) -> Result<Vec<ReconciliationItem>, InventoryError> {
        Self::validate_counts(counts)?;
        self.ensure_pending("record counts on")?;

        let mut positions = Vec::with_capacity(counts.len());
        for count in counts {
            let position = self
                .items
                .iter()
                .position(|i| i.id == count.item_id)
                .ok_or_else(|| InventoryError::not_found("ReconciliationItem", count.item_id))?;
            positions.push(position);
        }

        for (count, &position) in counts.iter().zip(&positions) {
            self.items[position].record_count(count.physical_quantity, count.notes.clone());
        }

        // An item submitted twice in one batch is reported once, with its final count
        let mut updated: Vec<ReconciliationItem> = Vec::with_capacity(positions.len());
        for &position in &positions {
            let item = &self.items[position];
            if !updated.iter().any(|u| u.id == item.id) {
                updated.push(item.clone());
            }
        }
        Ok(updated)
    }

    /// Completes the session and returns the adjustments to apply
    ///
    /// Items never counted produce no adjustment.
    pub fn finalize(
        &mut self,
        finalized_by: impl Into<String>,
        finalized_at: DateTime<Utc>,
    ) -> Result<Vec<StockAdjustment>, InventoryError> {
        self.ensure_pending("finalize")?;

        let adjustments = self
            .items
            .iter()
            .filter_map(|item| {
                item.pending_adjustment().map(|difference| StockAdjustment {
                    reconciliation_item_id: item.id,
                    item_id: item.item_id,
                    item_type: item.item_type,
                    item_name: item.item_name.clone(),
                    difference,
                })
            })
            .collect();

        self.status = ReconciliationStatus::Completed;
        self.finalized_by = Some(finalized_by.into());
        self.finalized_at = Some(finalized_at);

        Ok(adjustments)
    }

    pub fn summary(&self) -> ReconciliationSummary {
        let counted: Vec<&ReconciliationItem> = self.items.iter().filter(|i| i.is_counted()).collect();
        ReconciliationSummary {
            total_items: self.items.len(),
            counted_items: counted.len(),
            uncounted_items: self.items.len() - counted.len(),
            discrepant_items: counted.iter().filter(|i| i.pending_adjustment().is_some()).count(),
            net_difference: counted.iter().filter_map(|i| i.difference).sum(),
        }
    }

    fn ensure_pending(&self, operation: &str) -> Result<(), InventoryError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(InventoryError::InvalidState(format!(
                "Cannot {} reconciliation {} in status {:?}",
                operation, self.id, self.status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::RawMaterialStatus;
    use rust_decimal_macros::dec;

    fn stock(warehouse_id: WarehouseId, quantity: Decimal) -> StockItem {
        StockItem {
            id: StockItemId::new(),
            item_type: StockItemType::RawMaterial,
            name: "Polyester staple fibre".to_string(),
            warehouse_id,
            quantity,
            unit: "kg".to_string(),
            raw_material_status: Some(RawMaterialStatus::InStock),
        }
    }

    fn session_with(quantities: &[Decimal]) -> StockReconciliation {
        let warehouse = WarehouseId::new();
        let items: Vec<StockItem> = quantities.iter().map(|q| stock(warehouse, *q)).collect();
        StockReconciliation::start(warehouse, "auditor", None, &items, Utc::now())
    }

    fn count(item: &ReconciliationItem, qty: Decimal) -> CountEntry {
        CountEntry { item_id: item.id, physical_quantity: qty, notes: None }
    }

    #[test]
    fn test_start_skips_other_warehouses_and_reserved_lots() {
        let warehouse = WarehouseId::new();
        let mut reserved = stock(warehouse, dec!(10));
        reserved.raw_material_status = Some(RawMaterialStatus::Reserved);
        let elsewhere = stock(WarehouseId::new(), dec!(10));
        let on_shelf = stock(warehouse, dec!(10));

        let session = StockReconciliation::start(
            warehouse,
            "auditor",
            Some("Quarterly count".to_string()),
            &[reserved, elsewhere, on_shelf.clone()],
            Utc::now(),
        );
        assert_eq!(session.items.len(), 1);
        assert_eq!(session.items[0].item_id, on_shelf.id);
        assert_eq!(session.items[0].physical_quantity, None);
        assert!(session.is_pending());
    }

    #[test]
    fn test_record_count_computes_difference_from_snapshot() {
        let mut session = session_with(&[dec!(500)]);
        let target = session.items[0].clone();

        let updated = session.record_counts(&[count(&target, dec!(480))]).unwrap();
        assert_eq!(updated[0].difference, Some(dec!(-20)));

        // Recording the same count again gives the same difference
        let again = session.record_counts(&[count(&target, dec!(480))]).unwrap();
        assert_eq!(again[0].difference, Some(dec!(-20)));
    }

    #[test]
    fn test_record_counts_rejects_bad_batches_atomically() {
        let mut session = session_with(&[dec!(5), dec!(6)]);
        let first = session.items[0].clone();

        assert!(matches!(session.record_counts(&[]), Err(InventoryError::Validation(_))));
        assert!(matches!(
            session.record_counts(&[count(&first, dec!(-1))]),
            Err(InventoryError::Validation(_))
        ));

        let stranger = CountEntry {
            item_id: ReconciliationItemId::new(),
            physical_quantity: dec!(1),
            notes: None,
        };
        let err = session.record_counts(&[count(&first, dec!(4)), stranger]).unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { .. }));
        assert!(!session.items[0].is_counted());
    }

    #[test]
    fn test_record_counts_rejects_excess_precision() {
        let mut session = session_with(&[dec!(100), dec!(50)]);
        let first = session.items[0].clone();
        let second = session.items[1].clone();

        let err = session
            .record_counts(&[count(&first, dec!(99)), count(&second, dec!(100.00004))])
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(!session.items[0].is_counted());

        // Trailing zeros beyond the stored scale are not extra precision
        let updated = session.record_counts(&[count(&second, dec!(49.250000))]).unwrap();
        assert_eq!(updated[0].difference, Some(dec!(-0.75)));
    }

    #[test]
    fn test_duplicate_entries_last_write_wins() {
        let mut session = session_with(&[dec!(10)]);
        let item = session.items[0].clone();
        let updated = session
            .record_counts(&[count(&item, dec!(7)), count(&item, dec!(9))])
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].physical_quantity, Some(dec!(9)));
        assert_eq!(updated[0].difference, Some(dec!(-1)));
    }

    #[test]
    fn test_finalize_skips_uncounted_and_matching_items() {
        let mut session = session_with(&[dec!(500), dec!(100), dec!(50)]);
        let items = session.items.clone();
        session
            .record_counts(&[count(&items[0], dec!(480)), count(&items[1], dec!(100))])
            .unwrap();

        let summary = session.summary();
        assert_eq!(summary.counted_items, 2);
        assert_eq!(summary.uncounted_items, 1);
        assert_eq!(summary.discrepant_items, 1);
        assert_eq!(summary.net_difference, dec!(-20));

        let adjustments = session.finalize("supervisor", Utc::now()).unwrap();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].item_id, items[0].item_id);
        assert_eq!(adjustments[0].difference, dec!(-20));
        assert_eq!(session.status, ReconciliationStatus::Completed);
        assert_eq!(session.finalized_by.as_deref(), Some("supervisor"));
    }

    #[test]
    fn test_completed_session_is_terminal() {
        let mut session = session_with(&[dec!(1)]);
        let item = session.items[0].clone();
        session.finalize("supervisor", Utc::now()).unwrap();

        assert!(matches!(
            session.finalize("supervisor", Utc::now()),
            Err(InventoryError::InvalidState(_))
        ));
        assert!(matches!(
            session.record_counts(&[count(&item, dec!(2))]),
            Err(InventoryError::InvalidState(_))
        ));
    }

    #[test]
    fn test_zero_count_is_allowed() {
        let mut session = session_with(&[dec!(3)]);
        let item = session.items[0].clone();
        let updated = session.record_counts(&[count(&item, Decimal::ZERO)]).unwrap();
        assert_eq!(updated[0].difference, Some(dec!(-3)));
    }
}
