use crate::types::HealthRes;

/// Simple health service shared by the REST server binaries.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Reports the service as alive.
    ///
    /// The check does not touch the counter store; a store outage shows up as failed
    /// allocations, not as an unhealthy process.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Lab number service is alive".into(),
        }
    }
}
