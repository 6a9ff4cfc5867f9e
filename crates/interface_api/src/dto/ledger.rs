//! Ledger and report DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `?as_of=` on ledger and report endpoints
#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<DateTime<Utc>>,
}
