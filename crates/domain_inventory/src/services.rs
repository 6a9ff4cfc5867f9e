//! Reconciliation service
//!
//! Orchestrates session state transitions against an [`InventoryPort`].
//! Starting a session, recording counts and finalizing each run in a
//! single unit of work.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{ReconciliationId, WarehouseId};

use crate::error::InventoryError;
use crate::movement::StockMovementLog;
use crate::ports::InventoryPort;
use crate::reconciliation::{CountEntry, ReconciliationItem, StockReconciliation};

/// Request to open a reconciliation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartReconciliation {
    pub warehouse_id: WarehouseId,
    pub started_by: String,
    pub notes: Option<String>,
}

/// Service for physical stock reconciliation
#[derive(Clone)]
pub struct ReconciliationService {
    port: Arc<dyn InventoryPort>,
}

impl ReconciliationService {
    pub fn new(port: Arc<dyn InventoryPort>) -> Self {
        Self { port }
    }

    /// Opens a session with a snapshot of the warehouse's countable stock
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the warehouse does not exist.
    #[instrument(skip(self, request), fields(warehouse_id = %request.warehouse_id))]
    pub async fn start_session(
        &self,
        request: StartReconciliation,
    ) -> Result<StockReconciliation, InventoryError> {
        if request.started_by.trim().is_empty() {
            return Err(InventoryError::validation("started_by is required"));
        }
        if self.port.find_warehouse(request.warehouse_id).await?.is_none() {
            return Err(InventoryError::not_found("Warehouse", request.warehouse_id));
        }

        let mut uow = self.port.begin().await?;
        let stock = uow.list_warehouse_stock(request.warehouse_id).await?;
        let session = StockReconciliation::start(
            request.warehouse_id,
            request.started_by,
            request.notes,
            &stock,
            Utc::now(),
        );
        uow.insert_session(&session).await?;
        uow.commit().await?;

        info!(
            reconciliation_id = %session.id,
            items = session.items.len(),
            "Reconciliation session started"
        );
        Ok(session)
    }

    /// Loads a session with its items
    #[instrument(skip(self), fields(reconciliation_id = %id))]
    pub async fn get_session(&self, id: ReconciliationId) -> Result<StockReconciliation, InventoryError> {
        debug!("Fetching reconciliation session");
        self.port
            .get_session(id)
            .await?
            .ok_or_else(|| InventoryError::not_found("StockReconciliation", id))
    }

    /// Records physical counts and returns the updated items
    ///
    /// # Errors
    ///
    /// `Validation` for an empty batch or negative quantities, `NotFound`
    /// for an unknown session or item, `InvalidState` once the session is
    /// completed.
    #[instrument(skip(self, counts), fields(reconciliation_id = %id, count = counts.len()))]
    pub async fn record_counts(
        &self,
        id: ReconciliationId,
        counts: Vec<CountEntry>,
    ) -> Result<Vec<ReconciliationItem>, InventoryError> {
        StockReconciliation::validate_counts(&counts)?;

        let mut uow = self.port.begin().await?;
        let mut session = uow
            .lock_session(id)
            .await?
            .ok_or_else(|| InventoryError::not_found("StockReconciliation", id))?;

        let updated = session.record_counts(&counts).inspect_err(|e| {
            warn!(error = %e, "Counts rejected");
        })?;
        uow.update_items(&updated).await?;
        uow.commit().await?;

        debug!(updated = updated.len(), "Counts recorded");
        Ok(updated)
    }

    /// Completes a session and applies its discrepancies to live stock
    ///
    /// For every counted item with a non-zero difference the live quantity
    /// is moved by that difference and an ADJUSTMENT movement is logged.
    /// Everything commits together with the status change.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the session is already completed.
    #[instrument(skip(self), fields(reconciliation_id = %id))]
    pub async fn finalize(
        &self,
        id: ReconciliationId,
        finalized_by: &str,
    ) -> Result<StockReconciliation, InventoryError> {
        if finalized_by.trim().is_empty() {
            return Err(InventoryError::validation("finalized_by is required"));
        }

        let mut uow = self.port.begin().await?;
        let mut session = uow
            .lock_session(id)
            .await?
            .ok_or_else(|| InventoryError::not_found("StockReconciliation", id))?;

        let now = Utc::now();
        let adjustments = session.finalize(finalized_by, now).inspect_err(|e| {
            warn!(error = %e, "Finalize rejected");
        })?;

        for adjustment in &adjustments {
            let quantity = uow
                .adjust_stock_quantity(adjustment.item_id, adjustment.difference)
                .await?;
            if quantity < Decimal::ZERO {
                warn!(
                    item_id = %adjustment.item_id,
                    quantity = %quantity,
                    "Live quantity went negative after adjustment"
                );
            }
            let movement = StockMovementLog::reconciliation_adjustment(&session, adjustment, finalized_by, now);
            uow.append_movement(&movement).await?;
        }

        uow.update_session_status(&session).await?;
        uow.commit().await?;

        info!(adjustments = adjustments.len(), "Reconciliation finalized");
        Ok(session)
    }
}
