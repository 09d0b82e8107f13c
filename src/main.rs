//! GoldBasis service entrypoint
//!
//! Loads configuration, builds the feed adapters and engine, then runs the
//! tick orchestrator (and the dashboard API when enabled) until ctrl-c.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use goldbasis::config::AppConfig;
use goldbasis::engine::{Engine, Orchestrator};
use goldbasis::feeds;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!(
        refresh_ms = config.engine.refresh_ms,
        window_ms = config.engine.window_ms,
        stale_ms = config.engine.stale_ms,
        "configuration loaded"
    );

    let engine = Arc::new(Engine::new(&config.engine));
    let sources = feeds::build_sources(&config)?;
    let (orchestrator, handle) = Orchestrator::new(engine.clone(), sources);

    let orchestrator_task = tokio::spawn(orchestrator.run());

    #[cfg(feature = "dashboard")]
    let dashboard_task = {
        let dashboard_engine = engine.clone();
        let dashboard_handle = handle.clone();
        let bind_addr = config.dashboard.bind_addr.clone();
        tokio::spawn(async move {
            if let Err(e) =
                goldbasis::dashboard::serve(dashboard_engine, dashboard_handle, &bind_addr).await
            {
                tracing::error!(error = %e, "dashboard server exited");
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    // The dashboard task owns a clone of the control handle; abort it first
    // so that dropping ours closes the command channel and stops the
    // orchestrator loop.
    #[cfg(feature = "dashboard")]
    dashboard_task.abort();
    drop(handle);
    let _ = orchestrator_task.await;
    Ok(())
}
