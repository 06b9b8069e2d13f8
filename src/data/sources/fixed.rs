//! Fixed-rate provider

use super::{is_valid_rate, RateSource};
use crate::data::pair::PairKey;
use crate::data::snapshot::RateMap;
use crate::error::{Result, ValutaError};

/// Serves the same rates on every call. No network access.
///
/// # Example
/// ```
/// use valutatrade::data::sources::{RateSource, StaticRateSource};
///
/// let source = StaticRateSource::new("Manual")
///     .with_rate("EUR", "USD", 1.08)
///     .unwrap();
/// assert_eq!(source.fetch_rates().unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    name: String,
    rates: RateMap,
}

impl StaticRateSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: RateMap::new(),
        }
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Result<Self> {
        if !is_valid_rate(rate) {
            return Err(ValutaError::InvalidData(format!(
                "rate must be positive, got: {}",
                rate
            )));
        }
        self.rates.insert(PairKey::new(from, to)?, rate);
        Ok(self)
    }
}

impl RateSource for StaticRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_rates(&self) -> Result<RateMap> {
        Ok(self.rates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_rates() {
        assert!(StaticRateSource::new("x").with_rate("EUR", "USD", 0.0).is_err());
        assert!(StaticRateSource::new("x").with_rate("EUR", "USD", -1.0).is_err());
        assert!(StaticRateSource::new("x").with_rate("EUR", "USD", f64::NAN).is_err());
    }

    #[test]
    fn test_returns_same_rates_each_call() {
        let source = StaticRateSource::new("x")
            .with_rate("eur", "usd", 1.1)
            .unwrap()
            .with_rate("BTC", "USD", 60000.0)
            .unwrap();

        assert_eq!(source.fetch_rates().unwrap(), source.fetch_rates().unwrap());
        assert_eq!(source.fetch_rates().unwrap().len(), 2);
    }
}
