//! Market rates singleton

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, DatabaseResult};

/// Fixed `_id` of the only document in the `marketRates` collection
pub const MARKET_RATES_ID: &str = "current";

/// Admin-maintained market rates shown on every dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRates {
    #[serde(rename = "_id")]
    pub id: String,
    pub gold_rate: f64,
    pub silver_rate: f64,
    pub market_index: f64,
    pub last_updated: DateTime<Utc>,
    /// Incremented on every write; used for optimistic concurrency
    pub version: i64,
}

/// Fields an admin may change. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRatesUpdate {
    pub gold_rate: Option<f64>,
    pub silver_rate: Option<f64>,
    pub market_index: Option<f64>,
    /// When set, the write only applies if the stored version matches
    pub expected_version: Option<i64>,
}

impl MarketRates {
    /// Merge `update` into `current`, producing the next stored document.
    ///
    /// `lastUpdated` is strictly greater than the previous stamp even when
    /// the clock has not advanced (or went backwards) between writes.
    pub fn next(
        current: Option<&MarketRates>,
        update: &MarketRatesUpdate,
        now: DateTime<Utc>,
    ) -> DatabaseResult<MarketRates> {
        let current_version = current.map(|c| c.version).unwrap_or(0);
        if let Some(expected) = update.expected_version {
            if expected != current_version {
                return Err(DatabaseError::Conflict(format!(
                    "market rates are at version {}, not {}",
                    current_version, expected
                )));
            }
        }

        let last_updated = match current {
            Some(c) if now <= c.last_updated => c.last_updated + Duration::microseconds(1),
            _ => now,
        };

        Ok(MarketRates {
            id: MARKET_RATES_ID.to_string(),
            gold_rate: update
                .gold_rate
                .unwrap_or_else(|| current.map(|c| c.gold_rate).unwrap_or(0.0)),
            silver_rate: update
                .silver_rate
                .unwrap_or_else(|| current.map(|c| c.silver_rate).unwrap_or(0.0)),
            market_index: update
                .market_index
                .unwrap_or_else(|| current.map(|c| c.market_index).unwrap_or(0.0)),
            last_updated,
            version: current_version + 1,
        })
    }

    /// Rates written by the seeding command when none exist yet
    pub fn initial(now: DateTime<Utc>) -> MarketRates {
        MarketRates {
            id: MARKET_RATES_ID.to_string(),
            gold_rate: 6500.0,
            silver_rate: 85.0,
            market_index: 22500.0,
            last_updated: now,
            version: 1,
        }
    }
}
