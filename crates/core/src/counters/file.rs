//! File-backed counter store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   counters.json    # { "<name>": { "value": u64, "updated_at": RFC 3339 }, ... }
//!   counters.lock    # present only while an increment is in progress
//! ```
//!
//! An increment holds an in-process mutex and the exclusive `counters.lock` file for the whole
//! read-increment-write, so several processes sharing one data directory are linearised too.
//! The new table is written to a temporary file and renamed over `counters.json`; readers
//! therefore see either the old table or the new one, never a partial write.

use super::{Counter, CounterStore};
use crate::config::CoreConfig;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use labnum_types::CounterName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCounter {
    value: u64,
    updated_at: DateTime<Utc>,
}

type CounterTable = BTreeMap<String, StoredCounter>;

/// Counter store persisted as a JSON table under the data directory.
#[derive(Debug)]
pub struct FileCounterStore {
    data_dir: PathBuf,
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    guard: Mutex<()>,
}

impl FileCounterStore {
    /// Opens the store described by `cfg`, creating the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataDirCreation` if the data directory cannot be created.
    pub fn open(cfg: &CoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(cfg.data_dir()).map_err(StoreError::DataDirCreation)?;

        Ok(Self {
            data_dir: cfg.data_dir().to_path_buf(),
            path: cfg.counters_file(),
            lock_path: cfg.counters_lock_file(),
            lock_timeout: cfg.lock_timeout(),
            guard: Mutex::new(()),
        })
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn read_table(&self) -> Result<CounterTable, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CounterTable::new()),
            Err(e) => return Err(StoreError::FileRead(e)),
        };

        // Only a missing file starts fresh; a blank one is corrupt.
        serde_json::from_str(&contents).map_err(StoreError::Deserialization)
    }

    fn write_table(&self, table: &CounterTable) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(table).map_err(StoreError::Serialization)?;
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path).map_err(StoreError::FileWrite)?;
        file.write_all(&bytes).map_err(StoreError::FileWrite)?;
        file.sync_all().map_err(StoreError::FileWrite)?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(StoreError::FileWrite)?;
        sync_dir(&self.data_dir)
    }
}

impl CounterStore for FileCounterStore {
    fn increment(&self, name: &CounterName) -> Result<u64, StoreError> {
        let _guard = self.guard.lock().map_err(|_| StoreError::LockPoisoned)?;
        let _lock = LockFile::acquire(&self.lock_path, self.lock_timeout)?;

        let mut table = self.read_table()?;
        let previous = table.get(name.as_str()).map_or(0, |c| c.value);
        let value = previous.checked_add(1).ok_or(StoreError::Overflow)?;
        table.insert(
            name.as_str().to_owned(),
            StoredCounter {
                value,
                updated_at: Utc::now(),
            },
        );

        self.write_table(&table)?;
        Ok(value)
    }

    fn get(&self, name: &CounterName) -> Result<Option<u64>, StoreError> {
        Ok(self.read_table()?.get(name.as_str()).map(|c| c.value))
    }

    fn list(&self) -> Result<Vec<Counter>, StoreError> {
        self.read_table()?
            .into_iter()
            .map(|(name, stored)| {
                let name = CounterName::new(&name).map_err(|e| {
                    StoreError::Deserialization(serde::de::Error::custom(e))
                })?;
                Ok(Counter {
                    name,
                    value: stored.value,
                })
            })
            .collect()
    }
}

/// Flushes directory metadata after a rename.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(StoreError::FileWrite)
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// Exclusive lock represented by the existence of a file; removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let started = Instant::now();

        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    // Holder pid, for operators inspecting a stale lock.
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if started.elapsed() >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(StoreError::LockAcquire(e)),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(
                "failed to remove counter lock {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config(dir: &TempDir, timeout: Duration) -> CoreConfig {
        CoreConfig::new(dir.path().join("data"), timeout, StoreKind::File).unwrap()
    }

    fn name(s: &str) -> CounterName {
        CounterName::new(s).unwrap()
    }

    #[test]
    fn open_creates_data_dir_and_starts_empty() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));
        let store = FileCounterStore::open(&cfg).unwrap();

        assert!(cfg.data_dir().is_dir());
        assert_eq!(store.get(&name("S_SERIES")).unwrap(), None);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));

        {
            let store = FileCounterStore::open(&cfg).unwrap();
            for expected in 1..=3 {
                assert_eq!(store.increment(&name("S_SERIES")).unwrap(), expected);
            }
        }

        let store = FileCounterStore::open(&cfg).unwrap();
        assert_eq!(store.get(&name("S_SERIES")).unwrap(), Some(3));
        assert_eq!(store.increment(&name("S_SERIES")).unwrap(), 4);
        assert!(!cfg.counters_lock_file().exists());
    }

    #[test]
    fn persisted_table_is_keyed_by_name() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));
        let store = FileCounterStore::open(&cfg).unwrap();
        store.increment(&name("F_SERIES")).unwrap();
        store.increment(&name("F_SERIES")).unwrap();

        let raw = fs::read_to_string(&store.path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["F_SERIES"]["value"], 2);
        assert!(json["F_SERIES"]["updated_at"].is_string());
    }

    #[test]
    fn failed_write_leaves_persisted_value_unchanged() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));
        let store = FileCounterStore::open(&cfg).unwrap();
        assert_eq!(store.increment(&name("S_SERIES")).unwrap(), 1);

        // A directory in the way of the temp file makes the write fail.
        fs::create_dir(store.temp_path()).unwrap();
        assert!(matches!(
            store.increment(&name("S_SERIES")),
            Err(StoreError::FileWrite(_))
        ));
        assert_eq!(store.get(&name("S_SERIES")).unwrap(), Some(1));
        assert!(!cfg.counters_lock_file().exists());

        fs::remove_dir(store.temp_path()).unwrap();
        assert_eq!(store.increment(&name("S_SERIES")).unwrap(), 2);
    }

    #[test]
    fn held_lock_times_out() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_millis(30));
        let store = FileCounterStore::open(&cfg).unwrap();
        fs::write(cfg.counters_lock_file(), "99999\n").unwrap();

        assert!(matches!(
            store.increment(&name("S_SERIES")),
            Err(StoreError::LockTimeout { .. })
        ));
        assert_eq!(store.get(&name("S_SERIES")).unwrap(), None);
        // The lock belongs to someone else and must not be removed.
        assert!(cfg.counters_lock_file().exists());
    }

    #[test]
    fn corrupt_table_is_reported() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));
        let store = FileCounterStore::open(&cfg).unwrap();
        fs::write(&store.path, "{ not json").unwrap();

        assert!(matches!(
            store.increment(&name("S_SERIES")),
            Err(StoreError::Deserialization(_))
        ));
        assert_eq!(fs::read_to_string(&store.path).unwrap(), "{ not json");
    }

    #[test]
    fn truncated_table_does_not_restart_sequence() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));
        let store = FileCounterStore::open(&cfg).unwrap();
        for _ in 0..5 {
            store.increment(&name("S_SERIES")).unwrap();
        }

        for blank in ["", "  \n"] {
            fs::write(&store.path, blank).unwrap();
            assert!(matches!(
                store.increment(&name("S_SERIES")),
                Err(StoreError::Deserialization(_))
            ));
            assert!(store.get(&name("S_SERIES")).is_err());
            assert_eq!(fs::read_to_string(&store.path).unwrap(), blank);
        }
    }

    #[test]
    fn missing_table_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(1));
        let store = FileCounterStore::open(&cfg).unwrap();
        assert!(!store.path.exists());
        assert_eq!(store.increment(&name("S_SERIES")).unwrap(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn directory_sync_reports_failure() {
        let dir = TempDir::new().unwrap();
        assert!(sync_dir(dir.path()).is_ok());
        assert!(matches!(
            sync_dir(&dir.path().join("gone")),
            Err(StoreError::FileWrite(_))
        ));
    }

    #[test]
    fn separate_store_instances_do_not_issue_duplicates() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(10));
        let mut handles = vec![];

        // Each thread opens its own store, standing in for a separate process.
        for _ in 0..4 {
            let cfg = cfg.clone();
            handles.push(thread::spawn(move || {
                let store = FileCounterStore::open(&cfg).unwrap();
                (0..25)
                    .map(|_| store.increment(&name("F_SERIES")).unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: BTreeSet<u64> = values.iter().copied().collect();

        assert_eq!(values.len(), 100);
        assert_eq!(unique, (1..=100).collect::<BTreeSet<u64>>());
    }

    #[test]
    fn shared_store_concurrent_increments_yield_exact_range() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, Duration::from_secs(10));
        let store = Arc::new(FileCounterStore::open(&cfg).unwrap());
        let mut handles = vec![];

        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                (0..25)
                    .map(|_| store.increment(&name("X")).unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let mut values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        values.sort_unstable();

        assert_eq!(values, (1..=100).collect::<Vec<u64>>());
    }
}
