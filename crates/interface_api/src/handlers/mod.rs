//! Request handlers, one module per resource

pub mod health;
pub mod ledger;
pub mod payments;
pub mod reconciliation;
pub mod reports;
