//! Billing domain errors

use core_kernel::{InvoiceId, Money, PortError};
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// A referenced invoice, account or party does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// Payment amount exceeds the remaining invoice balance
    #[error("Payment of {requested} exceeds outstanding balance {balance}")]
    Overpayment {
        requested: Money,
        balance: Money,
    },

    /// Invoice is fully paid and locked against further payments
    #[error("Invoice {0} is fully paid and locked")]
    LockedInvoice(InvoiceId),

    /// Operation not permitted in the current invoice state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed input rejected before any persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Arithmetic failed while aggregating amounts
    #[error("Calculation error: {0}")]
    Calculation(String),

    /// The store failed
    #[error("Storage error: {0}")]
    Storage(PortError),
}

impl BillingError {
    /// Creates a NotFound error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }
}

impl From<PortError> for BillingError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => BillingError::NotFound {
                entity: entity_type,
                id,
            },
            other => BillingError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_port_not_found_becomes_domain_not_found() {
        let err: BillingError = PortError::not_found("Invoice", "INV-1").into();
        assert!(matches!(err, BillingError::NotFound { ref entity, .. } if entity == "Invoice"));
    }

    #[test]
    fn test_other_port_errors_are_storage() {
        let err: BillingError = PortError::connection("refused").into();
        assert!(matches!(err, BillingError::Storage(PortError::Connection { .. })));
    }

    #[test]
    fn test_overpayment_message() {
        let err = BillingError::Overpayment {
            requested: Money::new(dec!(700)),
            balance: Money::new(dec!(600)),
        };
        assert_eq!(err.to_string(), "Payment of 700.00 exceeds outstanding balance 600.00");
    }
}
