//! Settings loaded from a TOML file
//!
//! Settings are read once and passed by reference to the store, the
//! updater and the reader. Nothing here is process-global.

use crate::currency::{get_currency, validate_code};
use crate::error::{Result, ValutaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `providers.exchangerate_api_key`
pub const API_KEY_ENV: &str = "EXCHANGERATE_API_KEY";

/// Longest accepted `rates_ttl_seconds` (100 years)
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// What happens to pairs that no provider returned in a refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Keep them with their old timestamp; the reader reports them stale
    #[default]
    CarryForward,
    /// Drop them from the snapshot
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub rates_file: PathBuf,
    pub history_file: PathBuf,
    pub rates_ttl_seconds: u64,
    pub base_currency: String,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_path: Option<PathBuf>,
    /// Size at which the log file rolls over
    pub log_max_bytes: u64,
    /// Rolled-over files kept next to the log (`actions.log.1` ...)
    pub log_backups: usize,
    pub snapshot_merge: MergePolicy,
    pub providers: ProviderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub coingecko_url: String,
    pub exchangerate_api_url: String,
    pub exchangerate_api_key: Option<String>,
    pub fiat_currencies: Vec<String>,
    /// Currency code -> CoinGecko coin id
    pub crypto_ids: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            rates_file: PathBuf::from("rates.json"),
            history_file: PathBuf::from("exchange_rates.json"),
            rates_ttl_seconds: 300,
            base_currency: "USD".to_string(),
            request_timeout_secs: 10,
            log_level: "info".to_string(),
            log_path: None,
            log_max_bytes: 1_000_000,
            log_backups: 3,
            snapshot_merge: MergePolicy::default(),
            providers: ProviderSettings::default(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let crypto_ids = [("BTC", "bitcoin"), ("ETH", "ethereum"), ("SOL", "solana")]
            .into_iter()
            .map(|(code, id)| (code.to_string(), id.to_string()))
            .collect();

        Self {
            coingecko_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            exchangerate_api_url: "https://v6.exchangerate-api.com/v6".to_string(),
            exchangerate_api_key: None,
            fiat_currencies: vec!["EUR".to_string(), "GBP".to_string(), "RUB".to_string()],
            crypto_ids,
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// location `~/.valutatrade/config.toml` is used when present, otherwise
    /// built-in defaults. The API key environment variable wins over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.providers.exchangerate_api_key = Some(key.trim().to_string());
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Parse a TOML file without applying environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ValutaError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ValutaError::Config(e.to_string()))
    }

    /// Normalize currency codes in place and reject unusable values.
    ///
    /// Every configured code must be in the currency registry, otherwise the
    /// fetched pairs could never be read back.
    pub fn validate(&mut self) -> Result<()> {
        self.base_currency = registered_code(&self.base_currency)?;

        self.providers.fiat_currencies = self
            .providers
            .fiat_currencies
            .iter()
            .map(|code| registered_code(code))
            .collect::<Result<_>>()?;

        self.providers.crypto_ids = std::mem::take(&mut self.providers.crypto_ids)
            .into_iter()
            .map(|(code, id)| Ok((registered_code(&code)?, id)))
            .collect::<Result<_>>()?;

        if self.rates_ttl_seconds > MAX_TTL_SECONDS {
            return Err(ValutaError::Config(format!(
                "rates_ttl_seconds must be at most {}, got {}",
                MAX_TTL_SECONDS, self.rates_ttl_seconds
            )));
        }

        if self.log_max_bytes == 0 {
            return Err(ValutaError::Config(
                "log_max_bytes must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ValutaError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn rates_path(&self) -> PathBuf {
        self.data_dir.join(&self.rates_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    /// Freshness window, capped at [`MAX_TTL_SECONDS`]
    pub fn ttl(&self) -> chrono::Duration {
        let secs = self.rates_ttl_seconds.min(MAX_TTL_SECONDS) as i64;
        chrono::Duration::try_seconds(secs).unwrap_or_else(chrono::Duration::zero)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn registered_code(code: &str) -> Result<String> {
    let code = validate_code(code)?;
    get_currency(&code)
        .map(|currency| currency.code.to_string())
        .map_err(|_| ValutaError::Config(format!("currency '{}' is not supported", code)))
}

/// `~/.valutatrade/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".valutatrade").join("config.toml"))
}
