//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `labnum-run` binary also loads a
//! `.env` file before starting the same server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use labnum_core::{
    config::{lock_timeout_from_env_value, store_kind_from_env_value},
    CoreConfig, CounterService, LabNumberService,
};

/// Main entry point for the lab number REST API server
///
/// # Environment Variables
/// - `LAB_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `LAB_DATA_DIR`: Directory holding `counters.json` (default: "lab_data")
/// - `LAB_COUNTER_LOCK_TIMEOUT_MS`: Counter lock timeout (default: 5000)
/// - `LAB_COUNTER_STORE`: `file` (default) or `memory`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("labnum_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("LAB_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("LAB_DATA_DIR")
        .unwrap_or_else(|_| labnum_core::DEFAULT_LAB_DATA_DIR.into());

    let cfg = CoreConfig::new(
        data_dir.into(),
        lock_timeout_from_env_value(std::env::var("LAB_COUNTER_LOCK_TIMEOUT_MS").ok())?,
        store_kind_from_env_value(std::env::var("LAB_COUNTER_STORE").ok())?,
    )?;

    tracing::info!(
        "-- Starting lab number REST API on {} (store: {:?}, data: {})",
        addr,
        cfg.store_kind(),
        cfg.data_dir().display()
    );

    let state = AppState {
        lab_numbers: LabNumberService::new(CounterService::from_config(&cfg)?),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
