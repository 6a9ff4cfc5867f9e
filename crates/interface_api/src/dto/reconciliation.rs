//! Reconciliation DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use core_kernel::{ReconciliationItemId, WarehouseId};
use domain_inventory::{
    CountEntry, ReconciliationItem, ReconciliationSummary, StartReconciliation, StockReconciliation,
    QUANTITY_SCALE,
};

fn valid_count(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("physical quantity cannot be negative".into());
        return Err(err);
    }
    if quantity.normalize().scale() > QUANTITY_SCALE {
        let mut err = ValidationError::new("scale");
        err.message = Some(format!("physical quantity allows at most {QUANTITY_SCALE} decimal places").into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartReconciliationRequest {
    pub warehouse_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub started_by: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<StartReconciliationRequest> for StartReconciliation {
    fn from(request: StartReconciliationRequest) -> Self {
        StartReconciliation {
            warehouse_id: WarehouseId::from_uuid(request.warehouse_id),
            started_by: request.started_by,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CountLine {
    /// Reconciliation item id
    pub item_id: Uuid,
    #[validate(custom(function = "valid_count"))]
    pub physical_quantity: Decimal,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordCountsRequest {
    #[validate(length(min = 1), nested)]
    pub counts: Vec<CountLine>,
}

impl RecordCountsRequest {
    pub fn into_entries(self) -> Vec<CountEntry> {
        self.counts
            .into_iter()
            .map(|line| CountEntry {
                item_id: ReconciliationItemId::from_uuid(line.item_id),
                physical_quantity: line.physical_quantity,
                notes: line.notes,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinalizeRequest {
    #[validate(length(min = 1, max = 120))]
    pub finalized_by: String,
}

/// A session together with its progress counters
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: StockReconciliation,
    pub summary: ReconciliationSummary,
}

impl From<StockReconciliation> for SessionResponse {
    fn from(session: StockReconciliation) -> Self {
        let summary = session.summary();
        Self { session, summary }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordCountsResponse {
    pub updated: Vec<ReconciliationItem>,
}
