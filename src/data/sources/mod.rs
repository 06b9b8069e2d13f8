//! Upstream rate providers
//!
//! Each provider turns one upstream call into a [`RateMap`]:
//! - CoinGecko: crypto prices quoted in the base currency
//! - ExchangeRate-API: fiat rates, inverted into `FIAT_BASE` pairs
//! - Static: fixed rates for offline use and tests

pub mod coingecko;
pub mod exchangerate;
pub mod fixed;

pub use coingecko::CoinGeckoSource;
pub use exchangerate::ExchangeRateApiSource;
pub use fixed::StaticRateSource;

use super::snapshot::RateMap;
use crate::config::Settings;
use crate::error::{Result, ValutaError};
use reqwest::blocking::Client;
use std::time::Duration;

/// A source of exchange rates
pub trait RateSource: Send + Sync {
    /// Identifier recorded as the `source` of every rate this provider returns
    fn name(&self) -> &str;

    /// Fetch every pair this provider can resolve.
    ///
    /// Pairs the upstream has no usable value for are left out. Transport,
    /// status, credential and top-level format problems are errors.
    fn fetch_rates(&self) -> Result<RateMap>;

    /// Case-insensitive prefix match on the name, used by `--source`
    fn matches(&self, filter: &str) -> bool {
        self.name()
            .to_lowercase()
            .starts_with(&filter.trim().to_lowercase())
    }
}

/// Result of asking one provider for rates
#[derive(Debug)]
pub enum SourceOutcome {
    Fetched { source: String, rates: RateMap },
    Failed { source: String, reason: String },
}

impl SourceOutcome {
    /// Run one provider, capturing its error instead of propagating it
    pub fn collect(provider: &dyn RateSource) -> Self {
        let source = provider.name().to_string();
        match provider.fetch_rates() {
            Ok(rates) => SourceOutcome::Fetched { source, rates },
            Err(e) => SourceOutcome::Failed {
                source,
                reason: e.to_string(),
            },
        }
    }
}

/// Providers configured in `settings`, crypto first then fiat.
///
/// Later providers win when two of them return the same pair.
pub fn default_sources(settings: &Settings) -> Result<Vec<Box<dyn RateSource>>> {
    Ok(vec![
        Box::new(CoinGeckoSource::from_settings(settings)?),
        Box::new(ExchangeRateApiSource::from_settings(settings)?),
    ])
}

pub(crate) fn http_client(provider: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("valutatrade/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ValutaError::provider(provider, format!("failed to create HTTP client: {}", e)))
}

/// A rate that can be cached: finite and strictly positive
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Keep only values that can be stored as a rate
pub(crate) fn positive_rate(value: Option<&serde_json::Value>) -> Option<f64> {
    value
        .and_then(serde_json::Value::as_f64)
        .filter(|rate| is_valid_rate(*rate))
}
