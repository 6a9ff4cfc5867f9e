//! Property-Based Test Generators
//!
//! Proptest strategies for amounts, payment splits and physical counts.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Money;

/// Strategy for positive amounts in minor units, up to ten million
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for an invoice total with a sequence of payments against it
///
/// The payments may add up to more than the total so overpayment
/// rejection gets exercised.
pub fn invoice_with_payments_strategy() -> impl Strategy<Value = (Money, Vec<Money>)> {
    (100i64..10_000_000i64).prop_flat_map(|total| {
        let payment = (1i64..=total).prop_map(Money::from_minor);
        (Just(Money::from_minor(total)), prop::collection::vec(payment, 1..8))
    })
}

/// Strategy for an invoice total split exactly into `1..=6` payments
pub fn exact_split_strategy() -> impl Strategy<Value = (Money, Vec<Money>)> {
    prop::collection::vec(1i64..1_000_000i64, 1..=6).prop_map(|parts| {
        let total: i64 = parts.iter().sum();
        (
            Money::from_minor(total),
            parts.into_iter().map(Money::from_minor).collect(),
        )
    })
}

/// Strategy for stock quantities with up to three decimal places
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 3))
}

/// Strategy for a system quantity paired with a physical count
pub fn count_pair_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (quantity_strategy(), quantity_strategy())
}

/// Strategy for day offsets used to age invoices
pub fn days_overdue_strategy() -> impl Strategy<Value = i64> {
    0i64..400i64
}
