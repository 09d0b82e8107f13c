//! Engine module - feed reconciliation and basis computation
//!
//! Owns the feed state store and the rolling sample buffer behind one
//! `RwLock`: single writer (the tick orchestrator, one synchronous section
//! per tick), many readers (snapshot/history accessors). Renderers never
//! mutate engine state.

pub mod basis;
mod buffer;
mod orchestrator;
mod snapshot;
mod state;

pub use buffer::{BasisSample, SampleBuffer, VenueBasis};
pub use orchestrator::{run_tick, Command, Orchestrator, OrchestratorHandle};
pub use snapshot::{ChartPoint, DislocationSnapshot, EngineSnapshot, FeedSnapshot};
pub use state::{FeedRecord, FeedStateStore};

use std::collections::HashMap;

use tokio::sync::{watch, RwLock};

use crate::config::EngineConfig;
use crate::feeds::FetchOutcome;
use crate::types::{AggregateStatus, DisplayUnit, Feed};

/// Mutable engine state, guarded by [`Engine::inner`]
#[derive(Debug)]
struct EngineInner {
    store: FeedStateStore,
    buffer: SampleBuffer,
    refresh_ms: u64,
    window_ms: u64,
    stale_ms: i64,
    unit: DisplayUnit,
    paused: bool,
    /// Start timestamp of the most recent tick, unix ms
    last_tick_ms: i64,
}

/// Shared engine instance
///
/// Multiple independent instances are supported (tests build their own);
/// nothing is process-global.
#[derive(Debug)]
pub struct Engine {
    inner: RwLock<EngineInner>,
    /// Bumped once per reconciled tick; renderers watch this
    render_tx: watch::Sender<u64>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        let (render_tx, _) = watch::channel(0);
        Self {
            inner: RwLock::new(EngineInner {
                store: FeedStateStore::new(),
                buffer: SampleBuffer::new(),
                refresh_ms: config.refresh_ms,
                window_ms: config.window_ms,
                stale_ms: config.stale_ms,
                unit: DisplayUnit::default(),
                paused: false,
                last_tick_ms: 0,
            }),
            render_tx,
        }
    }

    /// Subscribe to the render signal (receives the tick sequence number)
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.render_tx.subscribe()
    }

    /// Reconcile one completed tick: apply every outcome, append exactly one
    /// sample stamped with the tick timestamp, prune, then signal renderers.
    ///
    /// Overlapping ticks each call this with their own timestamp; the write
    /// lock serializes the reconcile sections, so per-tick updates stay
    /// internally consistent even when completion order inverts.
    pub async fn apply_tick(&self, tick_ms: i64, outcomes: &[FetchOutcome]) {
        let mut inner = self.inner.write().await;
        for outcome in outcomes {
            inner.store.apply_outcome(outcome, tick_ms);
        }
        inner.last_tick_ms = inner.last_tick_ms.max(tick_ms);

        let sample = build_sample(&inner.store, tick_ms);
        inner.buffer.append(sample);
        let window_ms = inner.window_ms;
        inner.buffer.prune(tick_ms, window_ms);
        drop(inner);

        self.render_tx.send_modify(|seq| *seq += 1);
    }

    pub async fn refresh_ms(&self) -> u64 {
        self.inner.read().await.refresh_ms
    }

    pub async fn is_paused(&self) -> bool {
        self.inner.read().await.paused
    }

    pub async fn set_paused(&self, paused: bool) {
        self.inner.write().await.paused = paused;
        self.render_tx.send_modify(|seq| *seq += 1);
    }

    pub async fn set_refresh_ms(&self, refresh_ms: u64) {
        self.inner.write().await.refresh_ms = refresh_ms;
    }

    /// Change the retention window and prune immediately so a shrink takes
    /// visible effect before the next tick
    pub async fn set_window_ms(&self, window_ms: u64, now: i64) {
        let mut inner = self.inner.write().await;
        inner.window_ms = window_ms;
        inner.buffer.prune(now, window_ms);
        drop(inner);
        self.render_tx.send_modify(|seq| *seq += 1);
    }

    pub async fn set_unit(&self, unit: DisplayUnit) {
        self.inner.write().await.unit = unit;
        self.render_tx.send_modify(|seq| *seq += 1);
    }

    /// Aggregate status at `now`; `Paused` overrides freshness
    pub async fn aggregate_status(&self, now: i64) -> AggregateStatus {
        let inner = self.inner.read().await;
        if inner.paused {
            return AggregateStatus::Paused;
        }
        inner.store.aggregate_status(now, inner.stale_ms)
    }

    /// Read-only snapshot for renderers
    pub async fn snapshot(&self, now: i64) -> EngineSnapshot {
        let inner = self.inner.read().await;
        snapshot::build_snapshot(&inner, now)
    }

    /// Pruned, unit-projected chart series.
    ///
    /// Prunes against `now` before reading, so chart reads never include
    /// samples past the retention horizon even between ticks.
    pub async fn history(&self, now: i64) -> Vec<ChartPoint> {
        let mut inner = self.inner.write().await;
        let window_ms = inner.window_ms;
        inner.buffer.prune(now, window_ms);
        let unit = inner.unit;
        inner.buffer.iter().map(|s| ChartPoint::project(s, unit)).collect()
    }
}

/// Compute one sample from current store contents. Basis degrades to
/// stale-but-valid venue mids; an unavailable oracle yields all-null basis.
fn build_sample(store: &FeedStateStore, tick_ms: i64) -> BasisSample {
    let reference = store.record(Feed::Pyth).mid;
    let reference_price = reference.is_finite().then_some(reference);

    let venues: HashMap<Feed, VenueBasis> = Feed::BASIS_VENUES
        .into_iter()
        .map(|feed| {
            let mid = store.record(feed).mid;
            (
                feed,
                VenueBasis {
                    basis_usd: basis::basis_usd(mid, reference),
                    basis_bps: basis::basis_bps(mid, reference),
                },
            )
        })
        .collect();

    let funding_apy_pct = store
        .record(Feed::BinanceFutures)
        .funding_rate
        .and_then(|rate| basis::funding_apy_pct(rate, basis::FUNDING_PERIODS_PER_YEAR));

    BasisSample {
        t: tick_ms,
        reference_price,
        venues,
        funding_apy_pct,
    }
}
