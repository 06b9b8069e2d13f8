//! CoinGecko crypto price provider
//!
//! `GET /simple/price?ids=bitcoin,ethereum&vs_currencies=usd` answers with
//! `{"bitcoin": {"usd": 60000.0}, ...}`. Each price is already "one coin in
//! base currency", so it is stored as-is under `CODE_BASE`.

use super::{http_client, positive_rate, RateSource};
use crate::config::Settings;
use crate::data::pair::PairKey;
use crate::data::snapshot::RateMap;
use crate::error::{Result, ValutaError};
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const NAME: &str = "CoinGecko";

pub struct CoinGeckoSource {
    url: String,
    base_currency: String,
    /// Currency code -> CoinGecko coin id
    coin_ids: BTreeMap<String, String>,
    client: Client,
}

impl CoinGeckoSource {
    pub fn new(
        url: impl Into<String>,
        base_currency: impl Into<String>,
        coin_ids: BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            base_currency: base_currency.into(),
            coin_ids,
            client: http_client(NAME, timeout)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.providers.coingecko_url.clone(),
            settings.base_currency.clone(),
            settings.providers.crypto_ids.clone(),
            settings.request_timeout(),
        )
    }

    fn parse_body(&self, body: &Value) -> Result<RateMap> {
        if !body.is_object() {
            return Err(ValutaError::provider(
                NAME,
                "response body is not a JSON object",
            ));
        }

        let vs_currency = self.base_currency.to_lowercase();
        let mut rates = RateMap::new();

        for (code, coin_id) in &self.coin_ids {
            let price = positive_rate(body.get(coin_id).and_then(|coin| coin.get(&vs_currency)));
            match (price, PairKey::new(code, &self.base_currency)) {
                (Some(price), Ok(pair)) => {
                    rates.insert(pair, price);
                }
                _ => log::debug!("{}: no usable price for {} ({})", NAME, code, coin_id),
            }
        }

        Ok(rates)
    }
}

impl RateSource for CoinGeckoSource {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch_rates(&self) -> Result<RateMap> {
        if self.coin_ids.is_empty() {
            return Ok(RateMap::new());
        }

        let ids = self
            .coin_ids
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let vs_currency = self.base_currency.to_lowercase();

        let response = self
            .client
            .get(&self.url)
            .query(&[("ids", ids.as_str()), ("vs_currencies", vs_currency.as_str())])
            .send()
            .map_err(|e| ValutaError::provider(NAME, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ValutaError::provider(
                NAME,
                format!("upstream returned {}", response.status()),
            ));
        }

        let body: Value = response
            .json()
            .map_err(|e| ValutaError::provider(NAME, format!("JSON parse error: {}", e)))?;

        self.parse_body(&body)
    }
}
