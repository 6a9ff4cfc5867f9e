//! Request and response bodies
//!
//! Requests are validated with `validator` before they reach a service.
//! Responses mostly serialize domain types directly.

pub mod ledger;
pub mod payment;
pub mod reconciliation;
