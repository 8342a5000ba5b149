//! Lab number allocation.
//!
//! A lab number has the form `LAB-<passport>-<series letter><sequence>`, for example
//! `LAB-P123-S007`. The sequence is zero-padded to three digits; from 1000 onwards it is
//! rendered at its natural width.

use crate::constants::{LAB_NUMBER_PREFIX, SEQUENCE_PAD_WIDTH};
use crate::counters::CounterService;
use crate::error::LabResult;
use crate::series::{MedicalType, Series};

/// The outcome of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabNumberAllocation {
    pub lab_number: String,
    pub series: Series,
    pub sequence_number: u64,
}

/// Issues lab numbers.
#[derive(Clone)]
pub struct LabNumberService {
    counters: CounterService,
}

impl LabNumberService {
    pub fn new(counters: CounterService) -> Self {
        Self { counters }
    }

    pub fn counters(&self) -> &CounterService {
        &self.counters
    }

    /// Allocates the next lab number for a patient.
    ///
    /// The medical type selects the series (see [`crate::series`]); the series counter is
    /// incremented exactly once and `passport_number` is embedded verbatim.
    ///
    /// # Errors
    ///
    /// Returns `LabError::CounterUnavailable` if the counter could not be incremented. No lab
    /// number was issued and the counter is unchanged.
    pub fn allocate(
        &self,
        medical_type: &str,
        passport_number: &str,
    ) -> LabResult<LabNumberAllocation> {
        let medical_type = MedicalType::parse(medical_type);
        if !medical_type.is_recognised() {
            tracing::warn!(
                medical_type = %medical_type,
                "unrecognised medical type, issuing from F series"
            );
        }

        let series = medical_type.series();
        let sequence_number = self.counters.increment_and_get(series.counter_name())?;
        let lab_number = format_lab_number(passport_number, series, sequence_number);

        tracing::info!(%series, sequence_number, "lab number allocated");

        Ok(LabNumberAllocation {
            lab_number,
            series,
            sequence_number,
        })
    }
}

/// Zero-pads `sequence_number` to three digits without truncating wider values.
pub fn format_sequence(sequence_number: u64) -> String {
    format!("{:0width$}", sequence_number, width = SEQUENCE_PAD_WIDTH)
}

/// Builds `LAB-<passport>-<letter><padded sequence>`.
pub fn format_lab_number(passport_number: &str, series: Series, sequence_number: u64) -> String {
    format!(
        "{}-{}-{}{}",
        LAB_NUMBER_PREFIX,
        passport_number,
        series.letter(),
        format_sequence(sequence_number)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoreConfig, StoreKind};
    use crate::counters::tests::FlakyStore;
    use crate::counters::{CounterStore, FileCounterStore, InMemoryCounterStore};
    use crate::error::LabError;
    use std::collections::BTreeSet;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn service() -> LabNumberService {
        LabNumberService::new(CounterService::new(Arc::new(InMemoryCounterStore::new())))
    }

    fn suffix(lab_number: &str, prefix: &str) -> u64 {
        lab_number
            .strip_prefix(prefix)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("{lab_number} does not start with {prefix}"))
    }

    #[test]
    fn pads_to_three_digits_without_truncating() {
        assert_eq!(format_sequence(1), "001");
        assert_eq!(format_sequence(9), "009");
        assert_eq!(format_sequence(42), "042");
        assert_eq!(format_sequence(999), "999");
        assert_eq!(format_sequence(1000), "1000");
        assert_eq!(format_lab_number("P9", Series::F, 12345), "LAB-P9-F12345");
    }

    #[test]
    fn sequential_s_series_scenario() {
        let service = service();
        let numbers: Vec<String> = ["A1", "A2", "A3"]
            .iter()
            .map(|p| service.allocate("SM-VDRL", p).unwrap().lab_number)
            .collect();
        assert_eq!(numbers, vec!["LAB-A1-S001", "LAB-A2-S002", "LAB-A3-S003"]);
    }

    #[test]
    fn s_series_suffix_strictly_increases() {
        let service = service();
        let mut previous = 0;
        for _ in 0..20 {
            let allocation = service.allocate("SM-VDRL", "P123").unwrap();
            assert_eq!(allocation.series, Series::S);
            let n = suffix(&allocation.lab_number, "LAB-P123-S");
            assert_eq!(n, allocation.sequence_number);
            assert!(n > previous);
            previous = n;
        }
    }

    #[test]
    fn f_types_and_fallback_share_one_sequence() {
        let service = service();
        let types = ["MAURITIUS", "NORMAL", "MEDICAL", "FM", "UNKNOWN_TYPE", ""];
        for (i, medical_type) in types.iter().cycle().take(12).enumerate() {
            let allocation = service.allocate(medical_type, "P9").unwrap();
            assert_eq!(allocation.series, Series::F);
            assert_eq!(allocation.sequence_number, i as u64 + 1);
            assert_eq!(
                allocation.lab_number,
                format!("LAB-P9-F{}", format_sequence(i as u64 + 1))
            );
        }
        assert_eq!(service.counters().current("F_SERIES").unwrap(), 12);
        assert_eq!(service.counters().current("S_SERIES").unwrap(), 0);
    }

    #[test]
    fn passport_is_embedded_verbatim() {
        let service = service();
        let allocation = service.allocate("FM", "AB 12-34").unwrap();
        assert_eq!(allocation.lab_number, "LAB-AB 12-34-F001");
    }

    #[test]
    fn concurrent_s_series_scenario() {
        let service = service();
        let handles: Vec<_> = ["A1", "A2", "A3"]
            .into_iter()
            .map(|passport| {
                let service = service.clone();
                thread::spawn(move || {
                    let allocation = service.allocate("SM-VDRL", passport).unwrap();
                    (passport, allocation.lab_number)
                })
            })
            .collect();

        let suffixes: BTreeSet<u64> = handles
            .into_iter()
            .map(|h| {
                let (passport, lab_number) = h.join().unwrap();
                suffix(&lab_number, &format!("LAB-{passport}-S"))
            })
            .collect();
        assert_eq!(suffixes, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn counter_failure_issues_no_number() {
        let store = Arc::new(FlakyStore::new());
        let service = LabNumberService::new(CounterService::new(store.clone()));
        service.allocate("SM-VDRL", "P1").unwrap();

        store.down.store(true, Ordering::SeqCst);
        let err = service.allocate("SM-VDRL", "P2").unwrap_err();
        assert!(matches!(
            err,
            LabError::CounterUnavailable { ref name, .. } if name == "S_SERIES"
        ));
        assert_eq!(service.counters().current("S_SERIES").unwrap(), 1);
    }

    #[test]
    fn file_store_failure_leaves_persisted_value_unchanged() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = CoreConfig::new(
            dir.path().to_path_buf(),
            Duration::from_secs(1),
            StoreKind::File,
        )
        .unwrap();
        let store = Arc::new(FileCounterStore::open(&cfg).unwrap());
        let service = LabNumberService::new(CounterService::new(store.clone()));
        assert_eq!(service.allocate("NORMAL", "P1").unwrap().lab_number, "LAB-P1-F001");

        std::fs::write(cfg.counters_lock_file(), "held").unwrap();
        let cfg_short = CoreConfig::new(
            dir.path().to_path_buf(),
            Duration::from_millis(20),
            StoreKind::File,
        )
        .unwrap();
        let impatient = LabNumberService::new(CounterService::new(Arc::new(
            FileCounterStore::open(&cfg_short).unwrap(),
        )));
        assert!(impatient
            .allocate("NORMAL", "P2")
            .unwrap_err()
            .is_counter_unavailable());

        let name = labnum_types::CounterName::new("F_SERIES").unwrap();
        assert_eq!(store.get(&name).unwrap(), Some(1));
    }
}
