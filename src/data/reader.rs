//! TTL-gated rate lookups over the snapshot store

use super::pair::PairKey;
use super::snapshot::{HistoryRecord, RateEntry};
use super::store::SnapshotStore;
use crate::config::Settings;
use crate::currency::get_currency;
use crate::error::{Result, ValutaError};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A fresh rate served from the cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub pair: PairKey,
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

impl RateQuote {
    /// Rate for the opposite direction, for display only
    pub fn inverse_rate(&self) -> f64 {
        1.0 / self.rate
    }
}

/// Filter for bulk listing
#[derive(Debug, Clone, Default)]
pub struct RateFilter {
    /// Pairs with this currency on either side
    pub currency: Option<String>,
    /// Pairs quoted in this currency
    pub base: Option<String>,
    /// Highest N rates only
    pub top: Option<usize>,
}

/// Bulk view of the cache
#[derive(Debug, Clone, PartialEq)]
pub struct RateListing {
    pub entries: Vec<(PairKey, RateEntry)>,
    pub last_refresh: Option<DateTime<Utc>>,
}

pub struct RateService<'a> {
    store: &'a SnapshotStore,
    ttl: Duration,
}

impl<'a> RateService<'a> {
    pub fn new(store: &'a SnapshotStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn from_settings(store: &'a SnapshotStore, settings: &Settings) -> Self {
        Self::new(store, settings.ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current rate for `from -> to`
    pub fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote> {
        self.get_rate_at(from, to, Utc::now())
    }

    /// Rate for `from -> to` judged fresh or stale against `now`.
    ///
    /// Only the exact `FROM_TO` key is consulted. An entry exactly `ttl` old
    /// is still fresh.
    pub fn get_rate_at(&self, from: &str, to: &str, now: DateTime<Utc>) -> Result<RateQuote> {
        let pair = resolve_pair(from, to)?;
        let snapshot = self.store.read_existing()?.unwrap_or_default();

        let entry = snapshot
            .get(&pair)
            .ok_or_else(|| ValutaError::RateUnavailable {
                pair: pair.to_string(),
            })?;

        let age = entry.age(now);
        if age > self.ttl {
            return Err(ValutaError::RateStale {
                pair: pair.to_string(),
                age_secs: age.num_seconds(),
                ttl_secs: self.ttl.num_seconds().max(0) as u64,
            });
        }

        Ok(RateQuote {
            rate: entry.rate,
            updated_at: entry.updated_at,
            source: entry.source.clone(),
            pair,
        })
    }

    /// Every cached pair matching `filter`, regardless of age.
    ///
    /// Sorted by pair key, or by rate descending when `top` is set.
    pub fn list_rates(&self, filter: &RateFilter) -> Result<RateListing> {
        let currency = filter.currency.as_deref().map(resolve_code).transpose()?;
        let base = filter.base.as_deref().map(resolve_code).transpose()?;
        let snapshot = self.store.read_existing()?.unwrap_or_default();

        let mut entries: Vec<(PairKey, RateEntry)> = snapshot
            .pairs
            .into_iter()
            .filter(|(pair, _)| currency.map_or(true, |code| pair.involves(code)))
            .filter(|(pair, _)| base.map_or(true, |code| pair.to_currency() == code))
            .collect();

        if let Some(top) = filter.top {
            entries.sort_by(|(_, a), (_, b)| b.rate.total_cmp(&a.rate));
            entries.truncate(top);
        }

        Ok(RateListing {
            entries,
            last_refresh: snapshot.last_refresh,
        })
    }

    /// Recorded observations for one pair, newest first
    pub fn history(&self, from: &str, to: &str, limit: Option<usize>) -> Result<Vec<HistoryRecord>> {
        let pair = resolve_pair(from, to)?;
        let mut records: Vec<HistoryRecord> = self
            .store
            .read_history()?
            .into_iter()
            .filter(|record| record.is_for(&pair))
            .collect();

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }
}

fn resolve_code(code: &str) -> Result<&'static str> {
    Ok(get_currency(code)?.code)
}

fn resolve_pair(from: &str, to: &str) -> Result<PairKey> {
    PairKey::new(resolve_code(from)?, resolve_code(to)?)
}
