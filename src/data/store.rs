//! File-backed snapshot and history storage
//!
//! Both files are JSON and are only ever replaced whole: the new content is
//! written to a sibling `*.tmp` file, synced, and renamed over the target.
//! A reader sees either the previous file or the new one, never a partial
//! write. A temp file left behind by a crash is ignored by reads and
//! overwritten by the next write.
//!
//! The history append is read-modify-write and assumes a single writer
//! process.

use super::snapshot::{HistoryRecord, Snapshot};
use crate::config::Settings;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    rates_path: PathBuf,
    history_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(rates_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            rates_path: rates_path.into(),
            history_path: history_path.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.rates_path(), settings.history_path())
    }

    pub fn rates_path(&self) -> &Path {
        &self.rates_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Load the current snapshot, creating an empty one on first use
    pub fn read(&self) -> Result<Snapshot> {
        if let Some(snapshot) = self.read_existing()? {
            return Ok(snapshot);
        }

        log::info!(
            "No snapshot at {}, initializing an empty one",
            self.rates_path.display()
        );
        let snapshot = Snapshot::default();
        self.write(&snapshot)?;
        Ok(snapshot)
    }

    /// Load the snapshot without creating it. `None` if the file is absent.
    pub fn read_existing(&self) -> Result<Option<Snapshot>> {
        if !self.rates_path.exists() {
            return Ok(None);
        }
        read_json(&self.rates_path).map(Some)
    }

    /// Atomically replace the snapshot file
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        atomic_write_json(&self.rates_path, snapshot)?;
        log::debug!(
            "Wrote {} pairs to {}",
            snapshot.len(),
            self.rates_path.display()
        );
        Ok(())
    }

    /// Full history log, oldest first. A missing file is an empty log.
    pub fn read_history(&self) -> Result<Vec<HistoryRecord>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.history_path)
    }

    /// Append records to the history log.
    ///
    /// An empty slice does not touch the file at all.
    pub fn append_history(&self, records: &[HistoryRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut history = self.read_history()?;
        history.extend_from_slice(records);
        atomic_write_json(&self.history_path, &history)?;

        log::debug!(
            "Appended {} history records ({} total) to {}",
            records.len(),
            history.len(),
            self.history_path.display()
        );
        Ok(())
    }
}

/// `rates.json` -> `rates.json.tmp`
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::pair::PairKey;
    use crate::data::snapshot::RateEntry;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::new(
            dir.path().join("data").join("rates.json"),
            dir.path().join("data").join("exchange_rates.json"),
        )
    }

    fn sample_snapshot() -> Snapshot {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut snapshot = Snapshot::default();
        snapshot.pairs.insert(
            "EUR_USD".parse::<PairKey>().unwrap(),
            RateEntry::new(1.1, dt, "ExchangeRate-API"),
        );
        snapshot.last_refresh = Some(dt);
        snapshot
    }

    #[test]
    fn test_read_initializes_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let snapshot = store.read().unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.last_refresh.is_none());
        assert!(store.rates_path().exists());
    }

    #[test]
    fn test_read_existing_does_not_create() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.read_existing().unwrap().is_none());
        assert!(!store.rates_path().exists());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let snapshot = sample_snapshot();

        store.write(&snapshot).unwrap();
        assert_eq!(store.read().unwrap(), snapshot);
        assert!(!temp_path(store.rates_path()).exists());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("data/rates.json")),
            PathBuf::from("data/rates.json.tmp")
        );
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.rates_path().parent().unwrap()).unwrap();
        fs::write(store.rates_path(), "{ not json").unwrap();

        assert!(matches!(
            store.read(),
            Err(crate::error::ValutaError::Serialization(_))
        ));
        // Left as-is for inspection
        assert_eq!(fs::read_to_string(store.rates_path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_append_history_creates_and_extends() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let pair: PairKey = "BTC_USD".parse().unwrap();

        store
            .append_history(&[HistoryRecord::new(&pair, 60000.0, dt, "CoinGecko")])
            .unwrap();
        store
            .append_history(&[
                HistoryRecord::new(&pair, 61000.0, dt, "CoinGecko"),
                HistoryRecord::new(&pair, 62000.0, dt, "CoinGecko"),
            ])
            .unwrap();

        let history = store.read_history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].rate, 60000.0);
        assert_eq!(history[2].rate, 62000.0);
    }

    #[test]
    fn test_empty_append_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.append_history(&[]).unwrap();
        assert!(!store.history_path().exists());
        assert!(store.read_history().unwrap().is_empty());
    }
}
