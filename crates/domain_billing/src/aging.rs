//! Aging and collection metrics
//!
//! Read-side aggregates over receivables. Nothing here mutates state.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PartyId};

use crate::account::AccountKind;
use crate::invoice::Invoice;
use crate::payment::InvoicePayment;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days elapsed since `issued_at`, counting any started day
///
/// An invoice issued one second ago is one day old; an invoice dated in
/// the future is zero days old.
pub fn age_in_days(issued_at: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    let seconds = (as_of - issued_at).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}

/// Aging bucket boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "0-30")]
    Current,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
}

impl AgingBucket {
    pub fn for_age(days: i64) -> Self {
        match days {
            d if d <= 30 => AgingBucket::Current,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }
}

/// Open balances grouped by age
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingBuckets {
    #[serde(rename = "0-30")]
    pub current: Money,
    #[serde(rename = "31-60")]
    pub days_31_60: Money,
    #[serde(rename = "61-90")]
    pub days_61_90: Money,
    #[serde(rename = "90+")]
    pub over_90: Money,
}

impl AgingBuckets {
    /// Buckets the balances of the open invoices among `invoices`
    pub fn from_invoices<'a>(
        invoices: impl IntoIterator<Item = &'a Invoice>,
        as_of: DateTime<Utc>,
    ) -> Self {
        let mut buckets = Self::default();
        for invoice in invoices.into_iter().filter(|i| i.is_open()) {
            buckets.add(AgingBucket::for_age(age_in_days(invoice.issued_at, as_of)), invoice.balance);
        }
        buckets
    }

    pub fn add(&mut self, bucket: AgingBucket, amount: Money) {
        match bucket {
            AgingBucket::Current => self.current += amount,
            AgingBucket::Days31To60 => self.days_31_60 += amount,
            AgingBucket::Days61To90 => self.days_61_90 += amount,
            AgingBucket::Over90 => self.over_90 += amount,
        }
    }

    pub fn get(&self, bucket: AgingBucket) -> Money {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Days31To60 => self.days_31_60,
            AgingBucket::Days61To90 => self.days_61_90,
            AgingBucket::Over90 => self.over_90,
        }
    }

    pub fn total(&self) -> Money {
        self.current + self.days_31_60 + self.days_61_90 + self.over_90
    }
}

/// Aging for a single customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAging {
    pub party_id: PartyId,
    pub party_name: String,
    pub buckets: AgingBuckets,
    pub total: Money,
}

/// Receivables aging across all customers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: DateTime<Utc>,
    pub buckets: AgingBuckets,
    pub total_outstanding: Money,
    /// Customers with open balances, ordered by name
    pub accounts: Vec<AccountAging>,
}

impl AgingReport {
    /// Builds the report from every known invoice; payables and closed
    /// invoices are skipped
    pub fn build(invoices: &[Invoice], as_of: DateTime<Utc>) -> Self {
        let mut per_party: BTreeMap<PartyId, AccountAging> = BTreeMap::new();
        let mut buckets = AgingBuckets::default();

        let open = invoices
            .iter()
            .filter(|i| i.account_kind == AccountKind::Receivable && i.is_open());

        for invoice in open {
            let bucket = AgingBucket::for_age(age_in_days(invoice.issued_at, as_of));
            buckets.add(bucket, invoice.balance);

            let account = per_party.entry(invoice.party_id).or_insert_with(|| AccountAging {
                party_id: invoice.party_id,
                party_name: invoice.party_name.clone(),
                buckets: AgingBuckets::default(),
                total: Money::ZERO,
            });
            account.buckets.add(bucket, invoice.balance);
            account.total += invoice.balance;
        }

        let mut accounts: Vec<AccountAging> = per_party.into_values().collect();
        accounts.sort_by(|a, b| a.party_name.cmp(&b.party_name).then(a.party_id.cmp(&b.party_id)));

        Self {
            as_of,
            total_outstanding: buckets.total(),
            buckets,
            accounts,
        }
    }
}

/// Days sales outstanding and collection effectiveness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetrics {
    /// Days sales outstanding
    pub dso: Decimal,
    /// Collection effectiveness index, as a percentage
    pub cei: Decimal,
    pub open_receivables: Money,
    pub trailing_sales: Money,
    pub total_collected: Money,
    pub total_invoiced: Money,
}

impl CollectionMetrics {
    /// Computes metrics over receivable invoices and payments
    ///
    /// DSO is zero when there were no sales in the trailing year. CEI is
    /// 100 when nothing has been invoiced.
    pub fn calculate(
        invoices: &[Invoice],
        payments: &[InvoicePayment],
        as_of: DateTime<Utc>,
    ) -> Self {
        let window_start = as_of - Duration::days(365);
        let posted: Vec<&Invoice> = invoices
            .iter()
            .filter(|i| i.account_kind == AccountKind::Receivable && i.status.is_posted())
            .collect();

        let open_receivables: Money = posted.iter().filter(|i| i.is_open()).map(|i| i.balance).sum();
        let trailing_sales: Money = posted
            .iter()
            .filter(|i| i.issued_at > window_start && i.issued_at <= as_of)
            .map(|i| i.total_amount)
            .sum();
        let total_invoiced: Money = posted.iter().map(|i| i.total_amount).sum();
        let total_collected: Money = payments
            .iter()
            .filter(|p| p.account_kind == AccountKind::Receivable)
            .map(|p| p.amount)
            .sum();

        let dso = open_receivables
            .ratio_to(&trailing_sales)
            .map(|r| (r * dec!(365)).round_dp(2))
            .unwrap_or(Decimal::ZERO);
        let cei = total_collected
            .ratio_to(&total_invoiced)
            .map(|r| (r * dec!(100)).round_dp(2))
            .unwrap_or(dec!(100));

        Self {
            dso,
            cei,
            open_receivables,
            trailing_sales,
            total_collected,
            total_invoiced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_age_uses_ceiling_days() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(age_in_days(issued, issued), 0);
        assert_eq!(age_in_days(issued, issued + Duration::seconds(1)), 1);
        assert_eq!(age_in_days(issued, issued + Duration::days(30)), 30);
        assert_eq!(age_in_days(issued, issued + Duration::days(30) + Duration::hours(1)), 31);
        assert_eq!(age_in_days(issued, issued - Duration::days(3)), 0);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgingBucket::for_age(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(30), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(91), AgingBucket::Over90);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = CollectionMetrics::calculate(&[], &[], Utc::now());
        assert_eq!(metrics.dso, Decimal::ZERO);
        assert_eq!(metrics.cei, dec!(100));
    }

    #[test]
    fn test_buckets_serialize_with_range_labels() {
        let json = serde_json::to_value(AgingBuckets::default()).unwrap();
        assert!(json.get("0-30").is_some());
        assert!(json.get("90+").is_some());
    }
}
