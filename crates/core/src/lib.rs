//! # Lab Number Core
//!
//! Core business logic for lab number issuance.
//!
//! This crate contains pure data operations:
//! - Named sequence counters with atomic increment-and-get (`counters`)
//! - Medical type to series classification (`series`)
//! - Lab number allocation and formatting (`lab_number`)
//!
//! **No API concerns**: HTTP servers and CLI argument handling belong in `api-rest` and
//! `labnum-cli`.

pub mod config;
pub mod constants;
pub mod counters;
pub mod error;
pub mod lab_number;
pub mod series;

pub use config::{CoreConfig, StoreKind};
pub use constants::DEFAULT_LAB_DATA_DIR;
pub use counters::{Counter, CounterService, CounterStore, FileCounterStore, InMemoryCounterStore};
pub use error::{LabError, LabResult, StoreError};
pub use lab_number::{LabNumberAllocation, LabNumberService};
pub use labnum_types::CounterName;
pub use series::{MedicalType, Series};
