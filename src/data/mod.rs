//! Rate cache and refresh
//!
//! # Components
//!
//! - **pair**: `FROM_TO` pair keys
//! - **snapshot**: cached entries and history records
//! - **store**: atomic JSON persistence of the snapshot and history files
//! - **sources**: upstream rate providers
//! - **updater**: one refresh cycle across all providers
//! - **reader**: TTL-checked lookups for callers
//!
//! # Example
//!
//! ```rust
//! use valutatrade::data::{RateService, RatesUpdater, SnapshotStore};
//! use valutatrade::data::sources::{RateSource, StaticRateSource};
//! use chrono::Duration;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = SnapshotStore::new(dir.path().join("rates.json"), dir.path().join("history.json"));
//!
//! let source = StaticRateSource::new("Manual").with_rate("EUR", "USD", 1.08).unwrap();
//! let sources: Vec<Box<dyn RateSource>> = vec![Box::new(source)];
//! let summary = RatesUpdater::new(sources, &store).run_update().unwrap();
//! assert_eq!(summary.updated, 1);
//!
//! let service = RateService::new(&store, Duration::seconds(300));
//! let quote = service.get_rate("eur", "usd").unwrap();
//! assert_eq!(quote.rate, 1.08);
//! ```

pub mod pair;
pub mod reader;
pub mod snapshot;
pub mod sources;
pub mod store;
pub mod updater;

pub use pair::PairKey;
pub use reader::{RateFilter, RateListing, RateQuote, RateService};
pub use snapshot::{HistoryRecord, RateEntry, RateMap, Snapshot};
pub use store::SnapshotStore;
pub use updater::{RatesUpdater, SourceFailure, UpdateSummary};
