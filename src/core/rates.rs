use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ClientError;

/// Days a rate snapshot stays usable after its own date.
pub const RATE_SNAPSHOT_MAX_AGE_DAYS: u64 = 4;

/// Daily exchange-rate snapshot: units of each currency per one `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRates {
    pub base: String,
    pub date: NaiveDate,
    pub rates: BTreeMap<String, Decimal>,
}

impl CurrencyRates {
    /// Whether the snapshot is too old to use on `today`.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        match self.date.checked_add_days(Days::new(RATE_SNAPSHOT_MAX_AGE_DAYS)) {
            Some(limit) => today > limit,
            None => true,
        }
    }
}

/// Source of daily exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// A new snapshot against `base` (e.g. `"SEK"`), or `None` while the
    /// previously delivered one is still fresh.
    async fn refresh(&self, base: &str) -> Result<Option<CurrencyRates>, ClientError>;
}
