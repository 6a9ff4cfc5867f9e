//! Inventory domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the inventory domain
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A referenced warehouse, session or item does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// Operation not permitted in the current session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed input rejected before any persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// The store failed
    #[error("Storage error: {0}")]
    Storage(PortError),
}

impl InventoryError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        InventoryError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        InventoryError::Validation(message.into())
    }
}

impl From<PortError> for InventoryError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => InventoryError::NotFound {
                entity: entity_type,
                id,
            },
            other => InventoryError::Storage(other),
        }
    }
}
