//! Tick orchestrator
//!
//! Schedules polling ticks on a fixed cadence and forwards user controls
//! into the engine. Each tick is an independent spawned task: all adapters
//! are fetched concurrently, the tick waits for every outcome (success or
//! failure), then applies them in one reconcile section stamped with the
//! tick's own start timestamp.
//!
//! Consecutive ticks may overlap in flight if a cadence fires before the
//! previous tick's network calls settle; completion order then determines
//! sample order. That reordering is accepted: each sample carries its own
//! accurate timestamp. Pausing suppresses new ticks only and cancels
//! nothing in flight.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::Engine;
use crate::feeds::{timed_fetch, QuoteSource};
use crate::types::DisplayUnit;

/// User controls forwarded into the orchestrator
#[derive(Debug, Clone)]
pub enum Command {
    Pause,
    /// Resume triggers an immediate tick before the cadence restarts
    Resume,
    /// Manual refresh, independent of the cadence
    Refresh,
    SetRefreshMs(u64),
    SetWindowMs(u64),
    SetUnit(DisplayUnit),
}

/// Control handle held by the dashboard / caller
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl OrchestratorHandle {
    pub async fn send(&self, command: Command) {
        if self.cmd_tx.send(command).await.is_err() {
            warn!("orchestrator is gone, command dropped");
        }
    }
}

pub struct Orchestrator {
    engine: Arc<Engine>,
    sources: Arc<Vec<Box<dyn QuoteSource>>>,
    cmd_rx: mpsc::Receiver<Command>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<Engine>,
        sources: Vec<Box<dyn QuoteSource>>,
    ) -> (Self, OrchestratorHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        (
            Self {
                engine,
                sources: Arc::new(sources),
                cmd_rx,
            },
            OrchestratorHandle { cmd_tx },
        )
    }

    /// Run until every control handle is dropped.
    ///
    /// Fires one immediate tick, then polls on the configured cadence.
    pub async fn run(mut self) {
        info!(feeds = self.sources.len(), "orchestrator started");
        self.spawn_tick();

        loop {
            let refresh_ms = self.engine.refresh_ms().await;
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(refresh_ms)) => {
                    if self.engine.is_paused().await {
                        debug!("paused, tick suppressed");
                    } else {
                        self.spawn_tick();
                    }
                }
                command = self.cmd_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            info!("all control handles dropped, orchestrator stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_command(&self, command: Command) {
        debug!(?command, "control command");
        match command {
            Command::Pause => self.engine.set_paused(true).await,
            Command::Resume => {
                self.engine.set_paused(false).await;
                self.spawn_tick();
            }
            Command::Refresh => self.spawn_tick(),
            Command::SetRefreshMs(refresh_ms) => self.engine.set_refresh_ms(refresh_ms).await,
            Command::SetWindowMs(window_ms) => {
                let now = chrono::Utc::now().timestamp_millis();
                self.engine.set_window_ms(window_ms, now).await;
            }
            Command::SetUnit(unit) => self.engine.set_unit(unit).await,
        }
    }

    fn spawn_tick(&self) {
        let engine = self.engine.clone();
        let sources = self.sources.clone();
        tokio::spawn(run_tick(engine, sources));
    }
}

/// One polling tick: fetch all feeds concurrently, wait for every outcome,
/// reconcile once.
pub async fn run_tick(engine: Arc<Engine>, sources: Arc<Vec<Box<dyn QuoteSource>>>) {
    let tick_ms = chrono::Utc::now().timestamp_millis();

    let outcomes = join_all(sources.iter().map(|source| timed_fetch(source.as_ref()))).await;

    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.error {
            None => debug!(
                feed = %outcome.feed,
                elapsed_ms = outcome.elapsed_ms,
                "feed ok"
            ),
            Some(error) => {
                failed += 1;
                warn!(
                    feed = %outcome.feed,
                    elapsed_ms = outcome.elapsed_ms,
                    error = %error,
                    "feed failed"
                );
            }
        }
    }

    engine.apply_tick(tick_ms, &outcomes).await;
    info!(
        tick_ms,
        ok = outcomes.len() - failed,
        failed,
        "tick reconciled"
    );
}
