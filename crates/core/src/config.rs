//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Request handling never reads process-wide environment variables, which keeps behaviour
//! consistent in multi-threaded runtimes and test harnesses.

use crate::constants::{
    COUNTERS_FILENAME, COUNTERS_LOCK_FILENAME, DEFAULT_COUNTER_LOCK_TIMEOUT_MS,
};
use crate::{LabError, LabResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Which counter store backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Counters persisted under the data directory.
    #[default]
    File,
    /// Counters held in process memory; lost on restart.
    Memory,
}

impl FromStr for StoreKind {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(LabError::InvalidInput(format!(
                "unknown counter store '{other}' (expected 'file' or 'memory')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    lock_timeout: Duration,
    store_kind: StoreKind,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `LabError::InvalidInput` if `data_dir` is empty or `lock_timeout` is zero.
    pub fn new(
        data_dir: PathBuf,
        lock_timeout: Duration,
        store_kind: StoreKind,
    ) -> LabResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(LabError::InvalidInput("data_dir cannot be empty".into()));
        }
        if lock_timeout.is_zero() {
            return Err(LabError::InvalidInput(
                "counter lock timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            lock_timeout,
            store_kind,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn counters_file(&self) -> PathBuf {
        self.data_dir.join(COUNTERS_FILENAME)
    }

    pub fn counters_lock_file(&self) -> PathBuf {
        self.data_dir.join(COUNTERS_LOCK_FILENAME)
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store_kind
    }
}

/// Parse the counter lock timeout (milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn lock_timeout_from_env_value(value: Option<String>) -> LabResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let millis = match value {
        Some(v) => v.parse::<u64>().map_err(|_| {
            LabError::InvalidInput(format!(
                "counter lock timeout must be a whole number of milliseconds, got '{v}'"
            ))
        })?,
        None => DEFAULT_COUNTER_LOCK_TIMEOUT_MS,
    };

    if millis == 0 {
        return Err(LabError::InvalidInput(
            "counter lock timeout must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_millis(millis))
}

/// Parse the counter store kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreKind::File`].
pub fn store_kind_from_env_value(value: Option<String>) -> LabResult<StoreKind> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<StoreKind>())
        .transpose()
        .map(Option::unwrap_or_default)
}
