//! Medical type classification.
//!
//! Every lab number belongs to a [`Series`], and every series draws from exactly one counter.
//! Which series a patient receives is decided by the medical type recorded at registration.
//!
//! | Medical type                              | Series | Counter    |
//! |-------------------------------------------|--------|------------|
//! | `SM-VDRL`                                 | `S`    | `S_SERIES` |
//! | `MAURITIUS`, `NORMAL`, `MEDICAL`, `FM`    | `F`    | `F_SERIES` |
//! | anything else                             | `F`    | `F_SERIES` |
//!
//! Matching is exact and case-sensitive. The last row is a fallback, not an error: unrecognised
//! types are issued `F` numbers.

use crate::constants::{F_SERIES_COUNTER, S_SERIES_COUNTER};
use std::fmt;

/// A lab number series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Series {
    S,
    F,
}

impl Series {
    /// The single letter embedded in lab numbers of this series.
    pub fn letter(&self) -> &'static str {
        match self {
            Series::S => "S",
            Series::F => "F",
        }
    }

    /// The counter that issues sequence numbers for this series.
    pub fn counter_name(&self) -> &'static str {
        match self {
            Series::S => S_SERIES_COUNTER,
            Series::F => F_SERIES_COUNTER,
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Medical type as recorded on a lab number request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedicalType {
    SmVdrl,
    Mauritius,
    Normal,
    Medical,
    Fm,
    /// Any value without an explicit mapping, kept verbatim for logging.
    Unrecognised(String),
}

impl MedicalType {
    /// Classifies a raw medical type string. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SM-VDRL" => MedicalType::SmVdrl,
            "MAURITIUS" => MedicalType::Mauritius,
            "NORMAL" => MedicalType::Normal,
            "MEDICAL" => MedicalType::Medical,
            "FM" => MedicalType::Fm,
            other => MedicalType::Unrecognised(other.to_owned()),
        }
    }

    /// The series lab numbers for this medical type are issued from.
    pub fn series(&self) -> Series {
        match self {
            MedicalType::SmVdrl => Series::S,
            MedicalType::Mauritius
            | MedicalType::Normal
            | MedicalType::Medical
            | MedicalType::Fm => Series::F,
            // TODO: confirm the F-series fallback with the phlebotomy leads before adding new
            // medical types upstream.
            MedicalType::Unrecognised(_) => Series::F,
        }
    }

    pub fn is_recognised(&self) -> bool {
        !matches!(self, MedicalType::Unrecognised(_))
    }
}

impl From<&str> for MedicalType {
    fn from(raw: &str) -> Self {
        MedicalType::parse(raw)
    }
}

impl fmt::Display for MedicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicalType::SmVdrl => f.write_str("SM-VDRL"),
            MedicalType::Mauritius => f.write_str("MAURITIUS"),
            MedicalType::Normal => f.write_str("NORMAL"),
            MedicalType::Medical => f.write_str("MEDICAL"),
            MedicalType::Fm => f.write_str("FM"),
            MedicalType::Unrecognised(raw) => f.write_str(raw),
        }
    }
}
