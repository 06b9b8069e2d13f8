//! Error types for valutatrade

use thiserror::Error;

/// Main error type for valutatrade
#[derive(Error, Debug)]
pub enum ValutaError {
    #[error("Unknown currency '{0}'")]
    CurrencyNotFound(String),

    #[error("Provider {provider} failed: {reason}")]
    ProviderError { provider: String, reason: String },

    #[error("Rate {pair} is unavailable. Run 'update-rates' to fetch it")]
    RateUnavailable { pair: String },

    #[error("Rate {pair} is stale ({age_secs}s old, ttl {ttl_secs}s). Run 'update-rates' to refresh")]
    RateStale {
        pair: String,
        age_secs: i64,
        ttl_secs: u64,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl ValutaError {
    /// Shorthand for a provider failure
    pub fn provider(provider: impl Into<String>, reason: impl ToString) -> Self {
        ValutaError::ProviderError {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the two read-path errors that a refresh would fix
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self,
            ValutaError::RateUnavailable { .. } | ValutaError::RateStale { .. }
        )
    }
}

/// Result type alias for valutatrade operations
pub type Result<T> = std::result::Result<T, ValutaError>;
