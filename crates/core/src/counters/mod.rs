//! Sequence counters.
//!
//! A counter is a named, monotonically increasing integer. Each lab number series draws its
//! sequence numbers from exactly one counter.
//!
//! ## Atomicity
//!
//! Every [`CounterStore`] implements `increment` as a single critical section: the stored
//! value is read, incremented and persisted while the store holds exclusive access. Callers
//! never perform a read followed by a separate write, so concurrent increments for the same
//! counter always yield distinct, gap-free values `1..=k`.
//!
//! A failed increment leaves the stored value unchanged and issues no number. Failures are
//! reported once; the service does not retry, because a retry after an ambiguous failure could
//! consume two numbers.

mod file;
mod memory;

pub use file::FileCounterStore;
pub use memory::InMemoryCounterStore;

use crate::config::{CoreConfig, StoreKind};
use crate::error::{LabError, LabResult, StoreError};
use labnum_types::CounterName;
use std::sync::Arc;

/// A named counter and the last value issued from it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Counter {
    pub name: CounterName,
    pub value: u64,
}

/// Durable home of the counter table.
///
/// # Invariants
/// - `increment` returns `previous + 1`, where an absent counter counts as 0.
/// - Concurrent `increment` calls for one name never return the same value.
/// - An `increment` that returns `Err` has not changed the stored value.
pub trait CounterStore: Send + Sync {
    /// Atomically increments `name` and returns the new value, creating the counter at 1 if
    /// it does not exist yet.
    fn increment(&self, name: &CounterName) -> Result<u64, StoreError>;

    /// Returns the last issued value for `name`, or `None` if it has never been incremented.
    fn get(&self, name: &CounterName) -> Result<Option<u64>, StoreError>;

    /// Returns every counter, ordered by name.
    fn list(&self) -> Result<Vec<Counter>, StoreError>;
}

/// Counter operations exposed to the rest of the system.
#[derive(Clone)]
pub struct CounterService {
    store: Arc<dyn CounterStore>,
}

impl CounterService {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Builds the service over the store selected in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `LabError::CounterUnavailable` if the file store's data directory cannot be
    /// created.
    pub fn from_config(cfg: &CoreConfig) -> LabResult<Self> {
        let store: Arc<dyn CounterStore> = match cfg.store_kind() {
            StoreKind::File => Arc::new(
                FileCounterStore::open(cfg)
                    .map_err(|e| LabError::unavailable("*", e))?,
            ),
            StoreKind::Memory => Arc::new(InMemoryCounterStore::new()),
        };
        Ok(Self::new(store))
    }

    /// Atomically increments the counter `name` and returns the new value.
    ///
    /// The first call for a fresh counter returns 1.
    ///
    /// # Errors
    ///
    /// - `LabError::InvalidInput` if `name` is empty; storage is not touched.
    /// - `LabError::CounterUnavailable` if the store could not perform the increment. No
    ///   number was issued and the stored value is unchanged.
    pub fn increment_and_get(&self, name: &str) -> LabResult<u64> {
        let name = CounterName::new(name)?;
        match self.store.increment(&name) {
            Ok(value) => {
                tracing::debug!(counter = %name, value, "counter incremented");
                Ok(value)
            }
            Err(e) => {
                tracing::error!(counter = %name, error = %e, "counter increment failed");
                Err(LabError::unavailable(name.as_str(), e))
            }
        }
    }

    /// Returns the last issued value for `name`, 0 if the counter has never been used.
    pub fn current(&self, name: &str) -> LabResult<u64> {
        let name = CounterName::new(name)?;
        self.store
            .get(&name)
            .map(Option::unwrap_or_default)
            .map_err(|e| LabError::unavailable(name.as_str(), e))
    }

    /// Returns every counter and its last issued value, ordered by name.
    pub fn snapshot(&self) -> LabResult<Vec<Counter>> {
        self.store
            .list()
            .map_err(|e| LabError::unavailable("*", e))
    }
}
