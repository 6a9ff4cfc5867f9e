//! Tests for core_kernel error types

use core_kernel::money::MoneyError;
use core_kernel::{Money, PortError};
use rust_decimal_macros::dec;

#[test]
fn test_money_error_from_sub_cent_input() {
    let error = Money::try_new(dec!(10.005)).unwrap_err();

    match error {
        MoneyError::ExcessPrecision { amount, max_scale } => {
            assert_eq!(amount, dec!(10.005));
            assert_eq!(max_scale, 2);
        }
        other => panic!("Expected ExcessPrecision, got {other:?}"),
    }
}

#[test]
fn test_money_error_from_unparseable_input() {
    match "12,50".parse::<Money>() {
        Err(MoneyError::InvalidAmount(msg)) => assert!(msg.starts_with("12,50")),
        other => panic!("Expected InvalidAmount, got {other:?}"),
    }
}

#[test]
fn test_error_display_messages() {
    assert_eq!(MoneyError::DivisionByZero.to_string(), "Division by zero");
    assert_eq!(
        PortError::not_found("Warehouse", "WH-1").to_string(),
        "Not found: Warehouse with id WH-1"
    );
    assert_eq!(
        PortError::conflict("receipt sequence taken").to_string(),
        "Conflict: receipt sequence taken"
    );
}

#[test]
fn test_port_error_classification() {
    assert!(PortError::connection("refused").is_transient());
    assert!(!PortError::internal("bug").is_transient());
    assert!(!PortError::transformation("bad enum").is_not_found());
}
