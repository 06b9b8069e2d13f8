//! # valutatrade
//!
//! Exchange rate cache for a multi-currency wallet.
//!
//! Rates are pulled on demand from upstream providers (CoinGecko for crypto,
//! ExchangeRate-API for fiat), merged into one snapshot file plus an
//! append-only history file, and served to callers through a TTL check so
//! nobody trades on stale data.
//!
//! ## Example
//!
//! ```rust,no_run
//! use valutatrade::prelude::*;
//!
//! let settings = Settings::load(None)?;
//! let store = SnapshotStore::from_settings(&settings);
//!
//! let updater = RatesUpdater::new(default_sources(&settings)?, &store)
//!     .with_merge_policy(settings.snapshot_merge);
//! updater.run_update()?;
//!
//! let quote = RateService::from_settings(&store, &settings).get_rate("BTC", "USD")?;
//! println!("{} = {}", quote.pair, quote.rate);
//! # Ok::<(), valutatrade::error::ValutaError>(())
//! ```

pub mod config;
pub mod currency;
pub mod data;
pub mod error;
pub mod logging;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::{MergePolicy, Settings};
    pub use crate::currency::{get_currency, Currency};
    pub use crate::data::sources::{default_sources, RateSource};
    pub use crate::data::{PairKey, RateQuote, RateService, RatesUpdater, SnapshotStore};
    pub use crate::error::{Result, ValutaError};
}
