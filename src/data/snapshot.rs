//! Snapshot and history record types
//!
//! These are the on-disk shapes of the two rate files:
//!
//! ```json
//! { "pairs": { "BTC_USD": { "rate": 60000.0, "updated_at": "...", "source": "CoinGecko" } },
//!   "last_refresh": "2025-01-01T12:00:00Z" }
//! ```
//!
//! and a JSON array of [`HistoryRecord`].

use super::pair::PairKey;
use crate::config::MergePolicy;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rates returned by one provider call
pub type RateMap = BTreeMap<PairKey, f64>;

/// Current best-known rate for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

impl RateEntry {
    pub fn new(rate: f64, updated_at: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self {
            rate,
            updated_at,
            source: source.into(),
        }
    }

    /// Age relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.updated_at
    }
}

/// All cached pairs plus the time of the last successful refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub pairs: BTreeMap<PairKey, RateEntry>,
    #[serde(default)]
    pub last_refresh: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn get(&self, key: &PairKey) -> Option<&RateEntry> {
        self.pairs.get(key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Build the next generation from this one.
    ///
    /// `fresh` entries always win. Under [`MergePolicy::CarryForward`] pairs
    /// missing from `fresh` keep their previous entry.
    pub fn merged(
        &self,
        fresh: BTreeMap<PairKey, RateEntry>,
        refreshed_at: DateTime<Utc>,
        policy: MergePolicy,
    ) -> Snapshot {
        let mut pairs = match policy {
            MergePolicy::CarryForward => self.pairs.clone(),
            MergePolicy::Replace => BTreeMap::new(),
        };
        pairs.extend(fresh);

        Snapshot {
            pairs,
            last_refresh: Some(refreshed_at),
        }
    }
}

/// One immutable rate observation.
///
/// `id` is `PAIR_TIMESTAMP_SOURCE`, unique within a cycle even when two
/// providers return the same pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl HistoryRecord {
    pub fn new(
        pair: &PairKey,
        rate: f64,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        Self {
            id: format!(
                "{}_{}_{}",
                pair,
                timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                source
            ),
            from_currency: pair.from_currency().to_string(),
            to_currency: pair.to_currency().to_string(),
            rate,
            timestamp,
            source,
        }
    }

    pub fn is_for(&self, pair: &PairKey) -> bool {
        self.from_currency == pair.from_currency() && self.to_currency == pair.to_currency()
    }
}
