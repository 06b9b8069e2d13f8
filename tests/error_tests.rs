//! Error message formatting
//!
//! The CLI prints these verbatim, so the wording callers rely on is pinned here.

use std::io;
use valutatrade::error::ValutaError;

#[cfg(test)]
mod error_message_tests {
    use super::*;

    #[test]
    fn test_currency_not_found() {
        let err = ValutaError::CurrencyNotFound("XYZ".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Unknown currency"));
        assert!(msg.contains("XYZ"));
        assert!(!err.needs_refresh());
    }

    #[test]
    fn test_provider_error_names_provider_and_reason() {
        let err = ValutaError::provider("CoinGecko", "HTTP 429 Too Many Requests");
        let msg = err.to_string();
        assert!(msg.contains("CoinGecko"));
        assert!(msg.contains("429"));
        assert!(!err.needs_refresh());
    }

    #[test]
    fn test_rate_unavailable_suggests_update() {
        let err = ValutaError::RateUnavailable {
            pair: "EUR_USD".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("EUR_USD"));
        assert!(msg.contains("update-rates"));
        assert!(err.needs_refresh());
    }

    #[test]
    fn test_rate_stale_reports_age_and_ttl() {
        let err = ValutaError::RateStale {
            pair: "BTC_USD".to_string(),
            age_secs: 301,
            ttl_secs: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("BTC_USD"));
        assert!(msg.contains("301"));
        assert!(msg.contains("300"));
        assert!(msg.contains("update-rates"));
        assert!(err.needs_refresh());
    }

    #[test]
    fn test_io_error_converts_to_persistence() {
        let err: ValutaError = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(err, ValutaError::Persistence(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ValutaError = parse.into();
        assert!(matches!(err, ValutaError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_config_and_invalid_data() {
        let config = ValutaError::Config("request_timeout_secs must be positive".to_string());
        assert!(config.to_string().contains("Configuration error"));

        let invalid = ValutaError::InvalidData("rate must be positive".to_string());
        assert!(invalid.to_string().contains("rate must be positive"));
    }
}
