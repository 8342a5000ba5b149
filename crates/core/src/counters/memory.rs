use super::{Counter, CounterStore};
use crate::error::StoreError;
use labnum_types::CounterName;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Counter store held in process memory.
///
/// Increments are linearised by a single mutex. Values do not survive a restart and are not
/// shared between processes, so this store suits tests and throwaway deployments only.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<BTreeMap<CounterName, u64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_values(values: impl IntoIterator<Item = (CounterName, u64)>) -> Self {
        Self {
            counters: Mutex::new(values.into_iter().collect()),
        }
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, name: &CounterName) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        let value = counters.entry(name.clone()).or_insert(0);
        *value = value.checked_add(1).ok_or(StoreError::Overflow)?;
        Ok(*value)
    }

    fn get(&self, name: &CounterName) -> Result<Option<u64>, StoreError> {
        let counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(counters.get(name).copied())
    }

    fn list(&self) -> Result<Vec<Counter>, StoreError> {
        let counters = self.counters.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(counters
            .iter()
            .map(|(name, value)| Counter {
                name: name.clone(),
                value: *value,
            })
            .collect())
    }
}
