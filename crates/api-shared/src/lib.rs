//! # API Shared
//!
//! Shared request/response types and services for the lab number APIs.
//!
//! Contains:
//! - JSON wire types (`types` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `labnum-run` binary.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
