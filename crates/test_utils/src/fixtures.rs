//! Pre-built Test Fixtures
//!
//! Ready-to-use values shared by the billing and inventory test suites.
//! Dates are fixed so aging and metrics assertions are reproducible.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Money, PartyId, StockItemId, WarehouseId};
use domain_billing::{AccountProfile, PartyRole};
use domain_inventory::{RawMaterialStatus, StockItem, StockItemType, Warehouse};

static REFERENCE_TIME: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap());

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn rupees(amount: Decimal) -> Money {
        Money::new(amount)
    }

    /// A typical yarn invoice total
    pub fn invoice_total() -> Money {
        Money::new(dec!(1000.00))
    }

    pub fn partial_payment() -> Money {
        Money::new(dec!(400.00))
    }

    pub fn zero() -> Money {
        Money::ZERO
    }
}

/// Fixture for temporal test data
pub struct DateFixtures;

impl DateFixtures {
    /// The "now" used by reports in tests (2024-06-30 12:00 UTC)
    pub fn as_of() -> DateTime<Utc> {
        *REFERENCE_TIME
    }

    /// Start of business on the given 2024 day
    pub fn day(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap()
    }

    pub fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    /// `days` before [`DateFixtures::as_of`]
    pub fn days_before_as_of(days: i64) -> DateTime<Utc> {
        *REFERENCE_TIME - chrono::Duration::days(days)
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// A deterministic customer id
    pub fn customer_id() -> PartyId {
        PartyId::from_uuid(Uuid::parse_str("6f1c2a40-0000-4000-8000-000000000001").unwrap())
    }

    /// A deterministic vendor id
    pub fn vendor_id() -> PartyId {
        PartyId::from_uuid(Uuid::parse_str("6f1c2a40-0000-4000-8000-000000000002").unwrap())
    }

    pub fn warehouse_id() -> WarehouseId {
        WarehouseId::from_uuid(Uuid::parse_str("6f1c2a40-0000-4000-8000-0000000000a1").unwrap())
    }
}

/// Fixture for parties
pub struct PartyFixtures;

impl PartyFixtures {
    pub fn customer() -> AccountProfile {
        AccountProfile {
            party_id: IdFixtures::customer_id(),
            name: "Sunrise Garments".to_string(),
            role: PartyRole::Customer,
        }
    }

    pub fn vendor() -> AccountProfile {
        AccountProfile {
            party_id: IdFixtures::vendor_id(),
            name: "Coimbatore Spinning Mills".to_string(),
            role: PartyRole::Vendor,
        }
    }
}

/// Fixture for warehouses and stock
pub struct StockFixtures;

impl StockFixtures {
    pub fn warehouse() -> Warehouse {
        Warehouse {
            id: IdFixtures::warehouse_id(),
            code: "WH-MAIN".to_string(),
            name: "Main Godown".to_string(),
        }
    }

    /// 100 m of finished fabric
    pub fn fabric_roll(warehouse_id: WarehouseId) -> StockItem {
        StockItem {
            id: StockItemId::new(),
            item_type: StockItemType::FinishedGood,
            name: "Cotton Poplin 60in".to_string(),
            warehouse_id,
            quantity: dec!(100),
            unit: "m".to_string(),
            raw_material_status: None,
        }
    }

    /// 250 kg of yarn on the shelf
    pub fn yarn_lot(warehouse_id: WarehouseId) -> StockItem {
        StockItem {
            id: StockItemId::new(),
            item_type: StockItemType::RawMaterial,
            name: "Combed Yarn 40s".to_string(),
            warehouse_id,
            quantity: dec!(250),
            unit: "kg".to_string(),
            raw_material_status: Some(RawMaterialStatus::InStock),
        }
    }

    /// A yarn lot already issued to production, excluded from counts
    pub fn reserved_yarn_lot(warehouse_id: WarehouseId) -> StockItem {
        StockItem {
            raw_material_status: Some(RawMaterialStatus::Reserved),
            name: "Carded Yarn 30s".to_string(),
            ..Self::yarn_lot(warehouse_id)
        }
    }
}
