//! Dashboard Module
//!
//! HTTP API for the browser terminal UI. Only compiled when the
//! `dashboard` feature is enabled. The UI reads snapshots; controls are
//! forwarded into the orchestrator over its command channel.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::engine::{Engine, OrchestratorHandle};

/// Serve the dashboard API until the process exits
pub async fn serve(
    engine: Arc<Engine>,
    handle: OrchestratorHandle,
    bind_addr: &str,
) -> Result<()> {
    let router = create_router(engine, handle);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", bind_addr))?;
    info!(addr = %bind_addr, "dashboard API listening");
    axum::serve(listener, router)
        .await
        .context("Dashboard server error")?;
    Ok(())
}
