use std::path::PathBuf;

/// Failures raised by a counter store while performing an increment or a read.
///
/// These never reach callers directly: the counter service wraps them in
/// [`LabError::CounterUnavailable`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create counter data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to read counter file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write counter file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize counters: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize counters: {0}")]
    Deserialization(serde_json::Error),
    #[error("timed out waiting for counter lock (path: {path})", path = path.display())]
    LockTimeout { path: PathBuf },
    #[error("failed to acquire counter lock: {0}")]
    LockAcquire(std::io::Error),
    #[error("counter lock poisoned")]
    LockPoisoned,
    #[error("counter value overflow")]
    Overflow,
}

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("counter unavailable (name: {name}): {source}")]
    CounterUnavailable {
        name: String,
        #[source]
        source: StoreError,
    },
}

impl LabError {
    pub(crate) fn unavailable(name: impl Into<String>, source: StoreError) -> Self {
        LabError::CounterUnavailable {
            name: name.into(),
            source,
        }
    }

    /// Returns true if this is a [`LabError::CounterUnavailable`].
    pub fn is_counter_unavailable(&self) -> bool {
        matches!(self, LabError::CounterUnavailable { .. })
    }
}

impl From<labnum_types::NameError> for LabError {
    fn from(err: labnum_types::NameError) -> Self {
        LabError::InvalidInput(err.to_string())
    }
}

pub type LabResult<T> = std::result::Result<T, LabError>;
