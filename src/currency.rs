//! Currency registry and code validation

use crate::error::{Result, ValutaError};
use std::fmt;

/// Kind-specific currency metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrencyKind {
    /// Government-issued currency
    Fiat { issuing_country: &'static str },
    /// Crypto asset
    Crypto {
        algorithm: &'static str,
        market_cap: f64,
    },
}

/// A known currency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub kind: CurrencyKind,
}

impl Currency {
    const fn fiat(code: &'static str, name: &'static str, issuing_country: &'static str) -> Self {
        Self {
            code,
            name,
            kind: CurrencyKind::Fiat { issuing_country },
        }
    }

    const fn crypto(
        code: &'static str,
        name: &'static str,
        algorithm: &'static str,
        market_cap: f64,
    ) -> Self {
        Self {
            code,
            name,
            kind: CurrencyKind::Crypto {
                algorithm,
                market_cap,
            },
        }
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self.kind, CurrencyKind::Crypto { .. })
    }

    /// One-line description used by the `currencies` command
    pub fn display_info(&self) -> String {
        match self.kind {
            CurrencyKind::Fiat { issuing_country } => format!(
                "[FIAT] {} — {} (Issuing: {})",
                self.code, self.name, issuing_country
            ),
            CurrencyKind::Crypto {
                algorithm,
                market_cap,
            } => format!(
                "[CRYPTO] {} — {} (Algo: {}, MCAP: {:.2e})",
                self.code, self.name, algorithm, market_cap
            ),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

static REGISTRY: [Currency; 7] = [
    Currency::fiat("USD", "US Dollar", "United States"),
    Currency::fiat("EUR", "Euro", "Eurozone"),
    Currency::fiat("GBP", "British Pound Sterling", "United Kingdom"),
    Currency::fiat("RUB", "Russian Ruble", "Russia"),
    Currency::crypto("BTC", "Bitcoin", "SHA-256", 3_075_031_224_952.0),
    Currency::crypto("ETH", "Ethereum", "Ethash", 351_005_166_082.0),
    Currency::crypto("SOL", "Solana", "Proof of History", 70_302_875_011.0),
];

/// Trim and uppercase a currency code, rejecting anything that cannot be
/// one half of a `FROM_TO` pair key.
pub fn validate_code(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    let valid = (2..=5).contains(&code.chars().count())
        && code.chars().all(|c| c.is_ascii_alphanumeric());

    if !valid {
        return Err(ValutaError::InvalidData(format!(
            "currency code must be 2-5 alphanumeric characters, got '{}'",
            code
        )));
    }
    Ok(code)
}

/// Resolve user input to a registered currency
pub fn get_currency(code: &str) -> Result<&'static Currency> {
    let key = code.trim().to_uppercase();
    REGISTRY
        .iter()
        .find(|c| c.code == key)
        .ok_or(ValutaError::CurrencyNotFound(key))
}

/// All registered currencies, fiat first
pub fn all() -> &'static [Currency] {
    &REGISTRY
}
