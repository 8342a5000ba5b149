use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use labnum_core::{
    CoreConfig, CounterService, LabNumberService,
    config::{lock_timeout_from_env_value, store_kind_from_env_value},
};

/// Main entry point for the lab number service
///
/// Loads `.env`, resolves configuration once, and serves the REST API until Ctrl-C.
///
/// # Environment Variables
/// - `LAB_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `LAB_DATA_DIR`: Directory holding `counters.json` (default: "lab_data")
/// - `LAB_COUNTER_LOCK_TIMEOUT_MS`: Counter lock timeout (default: 5000)
/// - `LAB_COUNTER_STORE`: `file` (default) or `memory`
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("labnum_run=info".parse()?)
                .add_directive("labnum_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("LAB_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;
    let data_dir = std::env::var("LAB_DATA_DIR")
        .unwrap_or_else(|_| labnum_core::DEFAULT_LAB_DATA_DIR.into());

    let cfg = CoreConfig::new(
        data_dir.into(),
        lock_timeout_from_env_value(std::env::var("LAB_COUNTER_LOCK_TIMEOUT_MS").ok())?,
        store_kind_from_env_value(std::env::var("LAB_COUNTER_STORE").ok())?,
    )?;

    tracing::info!("++ Starting lab number REST on {}", rest_addr);
    tracing::info!(
        "++ Counter store: {:?} at {}",
        cfg.store_kind(),
        cfg.data_dir().display()
    );

    let state = AppState {
        lab_numbers: LabNumberService::new(CounterService::from_config(&cfg)?),
    };

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}
