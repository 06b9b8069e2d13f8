//! Logger setup and action logging

use crate::config::Settings;
use crate::error::{Result, ValutaError};
use env_logger::{Builder, Env, Target};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Initialize the global logger.
///
/// The level comes from `settings.log_level` unless `RUST_LOG` is set.
/// With `log_path` configured, records go to a size-rotated file instead of
/// stderr.
pub fn init(settings: &Settings) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(&settings.log_level));

    if let Some(path) = &settings.log_path {
        let file = RotatingFile::open(path, settings.log_max_bytes, settings.log_backups)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| ValutaError::Config(format!("logger already initialized: {}", e)))
}

/// Append-only log file that rolls over once it reaches `max_bytes`.
///
/// On rollover `actions.log` becomes `actions.log.1`, existing backups shift
/// up by one, and anything past `backups` is overwritten.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}", n));
        self.path.with_file_name(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = File::create(&self.path)?;
        } else {
            for n in (1..self.backups).rev() {
                let older = self.backup_path(n);
                if older.exists() {
                    fs::rename(&older, self.backup_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = open_append(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Run `f` and record its outcome under `action`
pub fn log_action<T, E, F>(action: &str, f: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
    E: std::fmt::Display,
{
    match f() {
        Ok(value) => {
            log::info!("{} succeeded", action);
            Ok(value)
        }
        Err(e) => {
            log::error!("{} failed: {}", action, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_action_passes_through() {
        let ok: std::result::Result<u32, String> = log_action("get-rate", || Ok(7));
        assert_eq!(ok, Ok(7));

        let err: std::result::Result<u32, String> = log_action("get-rate", || Err("boom".into()));
        assert_eq!(err, Err("boom".to_string()));
    }

    #[test]
    fn test_rotating_file_rolls_over_and_caps_backups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("actions.log");
        let mut log = RotatingFile::open(&path, 10, 2).unwrap();

        for line in ["first-line\n", "second-ln\n", "third-line\n", "fourth-ln\n"] {
            log.write_all(line.as_bytes()).unwrap();
        }
        log.flush().unwrap();

        let backup = |n: usize| dir.path().join("logs").join(format!("actions.log.{}", n));
        assert_eq!(fs::read_to_string(&path).unwrap(), "fourth-ln\n");
        assert_eq!(fs::read_to_string(backup(1)).unwrap(), "third-line\n");
        assert_eq!(fs::read_to_string(backup(2)).unwrap(), "second-ln\n");
        assert!(!backup(3).exists());
    }

    #[test]
    fn test_rotating_file_appends_below_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        fs::write(&path, "old\n").unwrap();

        let mut log = RotatingFile::open(&path, 1_000, 3).unwrap();
        log.write_all(b"new\n").unwrap();
        log.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
        assert!(!dir.path().join("actions.log.1").exists());
    }
}
