//! ExchangeRate-API fiat provider
//!
//! `GET {url}/{api_key}/latest/{BASE}` answers with
//! `{"result": "success", "rates": {"EUR": 0.85, ...}}` where each value is
//! how much of the target one unit of BASE buys. Pairs are stored as
//! `TARGET_BASE`, so every value is inverted: `{"EUR": 0.85}` against USD
//! becomes `EUR_USD = 1 / 0.85`.

use super::{http_client, is_valid_rate, positive_rate, RateSource};
use crate::config::Settings;
use crate::data::pair::PairKey;
use crate::data::snapshot::RateMap;
use crate::error::{Result, ValutaError};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

const NAME: &str = "ExchangeRate-API";

pub struct ExchangeRateApiSource {
    url: String,
    api_key: Option<String>,
    base_currency: String,
    currencies: Vec<String>,
    client: Client,
}

impl ExchangeRateApiSource {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        base_currency: impl Into<String>,
        currencies: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            api_key,
            base_currency: base_currency.into(),
            currencies,
            client: http_client(NAME, timeout)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.providers.exchangerate_api_url.clone(),
            settings.providers.exchangerate_api_key.clone(),
            settings.base_currency.clone(),
            settings.providers.fiat_currencies.clone(),
            settings.request_timeout(),
        )
    }

    fn parse_body(&self, body: &Value) -> Result<RateMap> {
        let result = body.get("result").and_then(Value::as_str);
        if result != Some("success") {
            let error_type = body
                .get("error-type")
                .and_then(Value::as_str)
                .unwrap_or("no error-type given");
            return Err(ValutaError::provider(
                NAME,
                format!("non-success result ({})", error_type),
            ));
        }

        let quoted = body
            .get("rates")
            .filter(|rates| rates.is_object())
            .ok_or_else(|| ValutaError::provider(NAME, "response has no rates object"))?;

        let mut rates = RateMap::new();
        for code in self.currencies.iter().filter(|c| **c != self.base_currency) {
            match (
                positive_rate(quoted.get(code.as_str())),
                PairKey::new(code, &self.base_currency),
            ) {
                (Some(base_to_target), Ok(pair)) => {
                    let rate = 1.0 / base_to_target;
                    if is_valid_rate(rate) {
                        rates.insert(pair, rate);
                    } else {
                        log::warn!("{}: {} inverts to unusable rate {}", NAME, code, rate);
                    }
                }
                _ => log::debug!("{}: no usable rate for {}", NAME, code),
            }
        }

        Ok(rates)
    }
}

impl RateSource for ExchangeRateApiSource {
    fn name(&self) -> &str {
        NAME
    }

    fn fetch_rates(&self) -> Result<RateMap> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ValutaError::provider(NAME, "API key not configured"))?;

        let url = format!(
            "{}/{}/latest/{}",
            self.url.trim_end_matches('/'),
            api_key,
            self.base_currency
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ValutaError::provider(NAME, format!("HTTP request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(ValutaError::provider(
                NAME,
                format!("upstream returned {}", response.status()),
            ));
        }

        let body: Value = response
            .json()
            .map_err(|e| ValutaError::provider(NAME, format!("JSON parse error: {}", e.without_url())))?;

        self.parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mockito::{Mock, Server};
    use serde_json::json;

    fn source_at(url: &str, api_key: Option<&str>) -> ExchangeRateApiSource {
        ExchangeRateApiSource::new(
            url,
            api_key.map(str::to_string),
            "USD",
            vec!["EUR".into(), "GBP".into(), "RUB".into(), "USD".into()],
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn source(api_key: Option<&str>) -> ExchangeRateApiSource {
        source_at("http://127.0.0.1:9/v6", api_key)
    }

    fn latest_mock(server: &mut Server, status: usize, body: &str) -> Mock {
        server
            .mock("GET", "/v6/test-key/latest/USD")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create()
    }

    fn key(s: &str) -> PairKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_inverts_rates() {
        let body = json!({
            "result": "success",
            "rates": {"USD": 1.0, "EUR": 0.85, "GBP": 0.8, "RUB": 90.0}
        });

        let rates = source(Some("k")).parse_body(&body).unwrap();
        assert_eq!(rates.len(), 3);
        assert_relative_eq!(rates[&key("EUR_USD")], 1.0 / 0.85);
        assert_relative_eq!(rates[&key("EUR_USD")], 1.1765, epsilon = 1e-4);
        assert_relative_eq!(rates[&key("GBP_USD")], 1.25, epsilon = 1e-12);
        assert_relative_eq!(rates[&key("RUB_USD")], 1.0 / 90.0);
        assert!(!rates.contains_key(&key("USD_USD")));
    }

    #[test]
    fn test_parse_skips_missing_currency() {
        let body = json!({
            "result": "success",
            "rates": {"EUR": 0.85, "GBP": "n/a"}
        });

        let rates = source(Some("k")).parse_body(&body).unwrap();
        assert_eq!(rates.len(), 1);
        assert!(rates.contains_key(&key("EUR_USD")));
    }

    #[test]
    fn test_parse_drops_rate_that_inverts_to_infinity() {
        let body = json!({
            "result": "success",
            "rates": {"EUR": 1e-310, "GBP": 0.8}
        });

        let rates = source(Some("k")).parse_body(&body).unwrap();
        assert_eq!(rates.len(), 1);
        assert!(!rates.contains_key(&key("EUR_USD")));
        assert!(rates.contains_key(&key("GBP_USD")));
    }

    #[test]
    fn test_parse_rejects_error_result() {
        let body = json!({"result": "error", "error-type": "invalid-key"});
        match source(Some("k")).parse_body(&body) {
            Err(ValutaError::ProviderError { reason, .. }) => assert!(reason.contains("invalid-key")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_missing_rates() {
        let body = json!({"result": "success"});
        assert!(source(Some("k")).parse_body(&body).is_err());
    }

    #[test]
    fn test_missing_api_key_fails_before_request() {
        for key in [None, Some("  ")] {
            match source(key).fetch_rates() {
                Err(ValutaError::ProviderError { provider, reason }) => {
                    assert_eq!(provider, "ExchangeRate-API");
                    assert!(reason.contains("API key"));
                }
                other => panic!("expected provider error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unreachable_upstream_is_provider_error() {
        let result = source(Some("secret")).fetch_rates();
        match result {
            Err(ValutaError::ProviderError { reason, .. }) => assert!(!reason.contains("secret")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_rates_over_http() {
        let mut server = Server::new();
        let mock = latest_mock(
            &mut server,
            200,
            r#"{"result": "success", "base_code": "USD", "rates": {"USD": 1, "EUR": 0.85, "GBP": 0.8}}"#,
        );

        let rates = source_at(&format!("{}/v6", server.url()), Some("test-key"))
            .fetch_rates()
            .unwrap();

        mock.assert();
        assert_eq!(rates.len(), 2);
        assert_relative_eq!(rates[&key("EUR_USD")], 1.1765, epsilon = 1e-4);
        assert_relative_eq!(rates[&key("GBP_USD")], 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_error_status_is_provider_error() {
        for status in [429, 500] {
            let mut server = Server::new();
            let mock = latest_mock(&mut server, status, r#"{"result": "error"}"#);

            match source_at(&format!("{}/v6", server.url()), Some("test-key")).fetch_rates() {
                Err(ValutaError::ProviderError { provider, reason }) => {
                    assert_eq!(provider, "ExchangeRate-API");
                    assert!(reason.contains(&status.to_string()), "reason: {}", reason);
                }
                other => panic!("expected provider error, got {:?}", other),
            }
            mock.assert();
        }
    }

    #[test]
    fn test_error_result_over_http() {
        let mut server = Server::new();
        let _mock = latest_mock(
            &mut server,
            200,
            r#"{"result": "error", "error-type": "invalid-key"}"#,
        );

        match source_at(&format!("{}/v6", server.url()), Some("test-key")).fetch_rates() {
            Err(ValutaError::ProviderError { reason, .. }) => {
                assert!(reason.contains("invalid-key"));
                assert!(!reason.contains("test-key"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_body_over_http() {
        let mut server = Server::new();
        let _mock = latest_mock(&mut server, 200, "[]");

        let result = source_at(&format!("{}/v6", server.url()), Some("test-key")).fetch_rates();
        assert!(matches!(result, Err(ValutaError::ProviderError { .. })));
    }
}
