//! Refresh cycle: fetch from every provider, merge, persist
//!
//! One cycle shares a single timestamp. Providers run in order and a failing
//! provider is logged and skipped. When two providers return the same pair
//! the later one wins; provider order is the priority order.
//!
//! A cycle that collected at least one rate performs exactly one snapshot
//! write and one history append. Storage errors abort the cycle.

use super::snapshot::{HistoryRecord, RateEntry};
use super::sources::{is_valid_rate, RateSource, SourceOutcome};
use super::store::SnapshotStore;
use crate::config::MergePolicy;
use crate::error::{Result, ValutaError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A provider that failed during a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// What a refresh cycle did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSummary {
    /// Distinct pairs written this cycle
    pub updated: usize,
    /// The cycle timestamp shared by every entry written
    pub last_refresh: DateTime<Utc>,
    /// Pairs returned by each provider that succeeded, in run order
    pub fetched: Vec<(String, usize)>,
    pub failures: Vec<SourceFailure>,
}

impl UpdateSummary {
    /// Every provider succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct RatesUpdater<'a> {
    sources: Vec<Box<dyn RateSource>>,
    store: &'a SnapshotStore,
    merge_policy: MergePolicy,
}

impl<'a> RatesUpdater<'a> {
    pub fn new(sources: Vec<Box<dyn RateSource>>, store: &'a SnapshotStore) -> Self {
        Self {
            sources,
            store,
            merge_policy: MergePolicy::default(),
        }
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Keep only providers whose name starts with `filter` (case-insensitive)
    pub fn only(mut self, filter: &str) -> Result<Self> {
        self.sources.retain(|source| source.matches(filter));
        if self.sources.is_empty() {
            return Err(ValutaError::Config(format!(
                "no rate provider matches '{}'",
                filter
            )));
        }
        Ok(self)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run one refresh cycle now
    pub fn run_update(&self) -> Result<UpdateSummary> {
        self.run_update_at(Utc::now())
    }

    /// Run one refresh cycle stamped with `now`
    pub fn run_update_at(&self, now: DateTime<Utc>) -> Result<UpdateSummary> {
        log::info!("Starting rates update with {} providers", self.sources.len());

        let outcomes: Vec<SourceOutcome> = self
            .sources
            .iter()
            .map(|source| SourceOutcome::collect(source.as_ref()))
            .collect();

        let mut fresh: BTreeMap<_, RateEntry> = BTreeMap::new();
        let mut history = Vec::new();
        let mut fetched = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                SourceOutcome::Fetched { source, rates } => {
                    log::info!("{}: fetched {} rates", source, rates.len());
                    let mut accepted = 0;

                    for (pair, rate) in rates {
                        if !is_valid_rate(rate) {
                            log::warn!("{}: dropping {} with unusable rate {}", source, pair, rate);
                            continue;
                        }
                        history.push(HistoryRecord::new(&pair, rate, now, source.as_str()));
                        if let Some(previous) =
                            fresh.insert(pair.clone(), RateEntry::new(rate, now, source.as_str()))
                        {
                            log::debug!(
                                "{} from {} overrides {} this cycle",
                                pair,
                                source,
                                previous.source
                            );
                        }
                        accepted += 1;
                    }
                    fetched.push((source, accepted));
                }
                SourceOutcome::Failed { source, reason } => {
                    log::error!("{} failed, skipping: {}", source, reason);
                    failures.push(SourceFailure { source, reason });
                }
            }
        }

        let updated = fresh.len();
        if updated > 0 {
            let previous = match self.merge_policy {
                MergePolicy::CarryForward => self.store.read_existing()?.unwrap_or_default(),
                MergePolicy::Replace => Default::default(),
            };
            let snapshot = previous.merged(fresh, now, self.merge_policy);

            self.store.write(&snapshot)?;
            self.store.append_history(&history)?;
            log::info!(
                "Rates update finished: {} pairs written, {} total cached",
                updated,
                snapshot.len()
            );
        } else {
            log::warn!("Rates update produced no rates, snapshot left unchanged");
        }

        Ok(UpdateSummary {
            updated,
            last_refresh: now,
            fetched,
            failures,
        })
    }
}
