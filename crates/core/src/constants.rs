//! Constants used throughout the lab number core crate.

/// Counter backing the `S` series.
pub const S_SERIES_COUNTER: &str = "S_SERIES";

/// Counter backing the `F` series.
pub const F_SERIES_COUNTER: &str = "F_SERIES";

/// Prefix of every issued lab number.
pub const LAB_NUMBER_PREFIX: &str = "LAB";

/// Minimum width of the zero-padded sequence part of a lab number.
pub const SEQUENCE_PAD_WIDTH: usize = 3;

/// Default directory for counter storage when no explicit directory is configured.
pub const DEFAULT_LAB_DATA_DIR: &str = "lab_data";

/// Filename for the persisted counter table.
pub const COUNTERS_FILENAME: &str = "counters.json";

/// Filename for the exclusive lock held while the counter table is updated.
pub const COUNTERS_LOCK_FILENAME: &str = "counters.lock";

/// Default time to wait for the counter lock before giving up, in milliseconds.
pub const DEFAULT_COUNTER_LOCK_TIMEOUT_MS: u64 = 5_000;
