//! JSON request and response bodies.
//!
//! Field names are camelCase on the wire to match the front-end forms.

use labnum_core::{Counter, LabNumberAllocation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Request to issue a lab number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLabNumberReq {
    /// Medical type, e.g. `SM-VDRL` or `NORMAL`. Unknown values are issued from the F series.
    pub medical_type: String,
    /// Embedded verbatim in the lab number.
    pub passport_number: String,
    /// Accepted for compatibility with existing clients; not used.
    #[serde(default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLabNumberRes {
    pub lab_number: String,
    pub series: String,
    pub sequence_number: u64,
}

impl From<LabNumberAllocation> for GenerateLabNumberRes {
    fn from(allocation: LabNumberAllocation) -> Self {
        Self {
            lab_number: allocation.lab_number,
            series: allocation.series.letter().to_string(),
            sequence_number: allocation.sequence_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CounterRes {
    pub name: String,
    pub value: u64,
}

impl From<Counter> for CounterRes {
    fn from(counter: Counter) -> Self {
        Self {
            name: counter.name.to_string(),
            value: counter.value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListCountersRes {
    pub counters: Vec<CounterRes>,
}

/// Error body. Messages are generic and never carry storage details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}
