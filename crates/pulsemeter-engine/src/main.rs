//! pulsemeter server
//!
//! - Config: `pulsemeter.yaml` (defaults when absent), strict parsing + validate
//! - Background refresh scheduler with the local process probe
//! - HTTP: JSON + Prometheus exporters, health probes
//! - Graceful shutdown on Ctrl-C: readiness flips first, then timers stop

use std::net::SocketAddr;
use std::path::Path;

use tracing_subscriber::{fmt, EnvFilter};

use pulsemeter_core::error::{MeterError, Result};
use pulsemeter_engine::{app_state, config, refresh::SysinfoProbe, router};

const CONFIG_PATH: &str = "pulsemeter.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH)?
    } else {
        tracing::info!(path = CONFIG_PATH, "config file not found, using defaults");
        config::MeterConfig::default()
    };
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| MeterError::BadConfig(format!("server.listen must be a valid SocketAddr: {e}")))?;

    let state = app_state::AppState::new(cfg)?;

    let mut scheduler = state.scheduler();
    match SysinfoProbe::new() {
        Ok(probe) => scheduler = scheduler.with_probe(Box::new(probe)),
        Err(e) => tracing::warn!(error = %e, "process probe unavailable; memory/cpu gauges stay at 0"),
    }
    let handle = scheduler.start();

    let app = router::build_router(state.clone());

    tracing::info!(%listen, "pulsemeter starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MeterError::Internal(format!("failed to bind {listen}: {e}")))?;

    let drain = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "ctrl-c handler failed");
            }
            drain.begin_draining();
            tracing::info!("shutdown signal received");
        })
        .await
        .map_err(|e| MeterError::Internal(format!("server failed: {e}")))?;

    handle.stop().await;
    tracing::info!("pulsemeter stopped");
    Ok(())
}
