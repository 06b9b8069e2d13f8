//! Currency pair keys

use crate::currency::validate_code;
use crate::error::{Result, ValutaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered `(from, to)` pair, serialized as `"FROM_TO"`.
///
/// The rate stored under a key converts one unit of `from` into `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PairKey {
    from: String,
    to: String,
}

impl PairKey {
    /// Build a key from two codes, normalizing case and whitespace
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: validate_code(from)?,
            to: validate_code(to)?,
        })
    }

    pub fn from_currency(&self) -> &str {
        &self.from
    }

    pub fn to_currency(&self) -> &str {
        &self.to
    }

    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// True if either side is `code`
    pub fn involves(&self, code: &str) -> bool {
        self.from == code || self.to == code
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

impl FromStr for PairKey {
    type Err = ValutaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('_') {
            Some((from, to)) => Self::new(from, to),
            None => Err(ValutaError::InvalidData(format!(
                "pair key must look like FROM_TO, got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for PairKey {
    type Error = ValutaError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PairKey> for String {
    fn from(key: PairKey) -> Self {
        key.to_string()
    }
}
