//! Render-facing snapshot projection
//!
//! DTOs serialized straight to the dashboard transport. Everything here is
//! derived read-only from engine state; nothing feeds back.

use serde::Serialize;

use super::{basis, BasisSample, EngineInner};
use crate::types::{AggregateStatus, DisplayUnit, Feed, FeedStatus};

/// One feed's row in the diagnostics table
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub feed: Feed,
    pub label: &'static str,
    /// Last good mid, absent until the first success
    pub mid: Option<f64>,
    pub publish_time_ms: Option<i64>,
    pub funding_rate: Option<f64>,
    pub next_funding_time_ms: Option<i64>,
    /// Age of the last success relative to the snapshot time
    pub age_ms: Option<i64>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub status: FeedStatus,
    /// Basis vs the oracle, present only for basis venues
    pub basis_usd: Option<f64>,
    pub basis_bps: Option<f64>,
}

/// Venue-vs-venue deviation row
#[derive(Debug, Clone, Serialize)]
pub struct DislocationSnapshot {
    pub venue_a: Feed,
    pub venue_b: Feed,
    pub usd: Option<f64>,
    pub bps: Option<f64>,
}

/// Complete read-only view consumed by renderers
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub timestamp: i64,
    pub aggregate_status: AggregateStatus,
    /// Per-feed errors joined with a separator, empty when healthy
    pub error_line: String,
    pub reference_price: Option<f64>,
    /// Reference change over the retained window (absolute, percent)
    pub session_change_usd: Option<f64>,
    pub session_change_pct: Option<f64>,
    /// Implied XAU/USDC from futures mid over the spot stablecoin mid
    pub implied_xau_usdc: Option<f64>,
    pub feeds: Vec<FeedSnapshot>,
    pub dislocations: Vec<DislocationSnapshot>,
    pub funding_apy_pct: Option<f64>,
    pub unit: DisplayUnit,
    pub refresh_ms: u64,
    pub window_ms: u64,
    pub stale_ms: i64,
    pub last_tick_ms: i64,
    pub sample_count: usize,
}

/// One chart point, already projected by the selected display unit
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub t: i64,
    pub reference: Option<f64>,
    pub binance_futures: Option<f64>,
    pub hyperliquid: Option<f64>,
    pub meteora: Option<f64>,
    pub funding_apy_pct: Option<f64>,
}

impl ChartPoint {
    pub(super) fn project(sample: &BasisSample, unit: DisplayUnit) -> Self {
        let pick = |feed: Feed| {
            sample.venues.get(&feed).and_then(|v| match unit {
                DisplayUnit::Usd => v.basis_usd,
                DisplayUnit::Bps => v.basis_bps,
            })
        };
        Self {
            t: sample.t,
            reference: sample.reference_price,
            binance_futures: pick(Feed::BinanceFutures),
            hyperliquid: pick(Feed::Hyperliquid),
            meteora: pick(Feed::Meteora),
            funding_apy_pct: sample.funding_apy_pct,
        }
    }
}

pub(super) fn build_snapshot(inner: &EngineInner, now: i64) -> EngineSnapshot {
    let store = &inner.store;
    let oracle = store.record(Feed::Pyth);
    let reference = oracle.mid;
    let reference_price = reference.is_finite().then_some(reference);

    let feeds = Feed::ALL
        .into_iter()
        .map(|feed| {
            let record = store.record(feed);
            let is_basis_venue = Feed::BASIS_VENUES.contains(&feed);
            FeedSnapshot {
                feed,
                label: feed.label(),
                mid: record.mid.is_finite().then_some(record.mid),
                publish_time_ms: record.publish_time_ms,
                funding_rate: record.funding_rate,
                next_funding_time_ms: record.next_funding_time_ms,
                age_ms: record.last_success_ms.map(|ok_ms| (now - ok_ms).max(0)),
                latency_ms: record.last_latency_ms,
                error: (!record.last_error.is_empty()).then(|| record.last_error.clone()),
                status: record.status(now, inner.stale_ms),
                basis_usd: is_basis_venue
                    .then(|| basis::basis_usd(record.mid, reference))
                    .flatten(),
                basis_bps: is_basis_venue
                    .then(|| basis::basis_bps(record.mid, reference))
                    .flatten(),
            }
        })
        .collect();

    let futures_mid = store.record(Feed::BinanceFutures).mid;
    let spot_mid = store.record(Feed::BinanceSpot).mid;
    let meteora_mid = store.record(Feed::Meteora).mid;
    let hl_mid = store.record(Feed::Hyperliquid).mid;

    let implied_xau_usdc = (futures_mid.is_finite() && spot_mid.is_finite() && spot_mid > 0.0)
        .then(|| futures_mid / spot_mid);

    let dislocations = vec![
        DislocationSnapshot {
            venue_a: Feed::Meteora,
            venue_b: Feed::BinanceFutures,
            usd: basis::dislocation_usd(meteora_mid, futures_mid),
            bps: basis::dislocation_bps(meteora_mid, futures_mid),
        },
        DislocationSnapshot {
            venue_a: Feed::Meteora,
            venue_b: Feed::Hyperliquid,
            usd: basis::dislocation_usd(meteora_mid, hl_mid),
            bps: basis::dislocation_bps(meteora_mid, hl_mid),
        },
    ];

    let (session_change_usd, session_change_pct) = session_change(inner);

    let funding_apy_pct = store
        .record(Feed::BinanceFutures)
        .funding_rate
        .and_then(|rate| basis::funding_apy_pct(rate, basis::FUNDING_PERIODS_PER_YEAR));

    let aggregate_status = if inner.paused {
        AggregateStatus::Paused
    } else {
        store.aggregate_status(now, inner.stale_ms)
    };

    EngineSnapshot {
        timestamp: now,
        aggregate_status,
        error_line: store.error_summary(),
        reference_price,
        session_change_usd,
        session_change_pct,
        implied_xau_usdc,
        feeds,
        dislocations,
        funding_apy_pct,
        unit: inner.unit,
        refresh_ms: inner.refresh_ms,
        window_ms: inner.window_ms,
        stale_ms: inner.stale_ms,
        last_tick_ms: inner.last_tick_ms,
        sample_count: inner.buffer.len(),
    }
}

/// Reference-price move between the oldest and newest retained samples
fn session_change(inner: &EngineInner) -> (Option<f64>, Option<f64>) {
    let (first, last) = match (inner.buffer.front(), inner.buffer.back()) {
        (Some(first), Some(last)) if first.t != last.t => (first, last),
        _ => return (None, None),
    };
    match (first.reference_price, last.reference_price) {
        (Some(p0), Some(p1)) => {
            let change = p1 - p0;
            let pct = (p0 != 0.0).then(|| change / p0 * 100.0);
            (Some(change), pct)
        }
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::feeds::{FetchOutcome, NormalizedQuote};

    fn outcome(feed: Feed, quote: Option<NormalizedQuote>, error: Option<&str>) -> FetchOutcome {
        FetchOutcome {
            feed,
            quote,
            elapsed_ms: 7,
            error: error.map(str::to_string),
        }
    }

    fn engine() -> Engine {
        Engine::new(&EngineConfig {
            refresh_ms: 5_000,
            window_ms: 3_600_000,
            stale_ms: 30_000,
        })
    }

    #[tokio::test]
    async fn test_snapshot_reference_scenario() {
        let engine = engine();
        let futures_quote = NormalizedQuote {
            mid: 2651.0,
            publish_time_ms: None,
            funding_rate: Some(0.0001),
            next_funding_time_ms: Some(1_714_003_200_000),
        };
        engine
            .apply_tick(
                1_000,
                &[
                    outcome(Feed::Pyth, Some(NormalizedQuote::mid_only(2650.12)), None),
                    outcome(Feed::BinanceFutures, Some(futures_quote), None),
                    outcome(Feed::BinanceSpot, Some(NormalizedQuote::mid_only(0.9998)), None),
                    outcome(Feed::Hyperliquid, Some(NormalizedQuote::mid_only(2652.0)), None),
                    outcome(Feed::Meteora, Some(NormalizedQuote::mid_only(2652.5)), None),
                ],
            )
            .await;

        let snapshot = engine.snapshot(1_000).await;
        assert_eq!(snapshot.aggregate_status, AggregateStatus::Live);
        assert_eq!(snapshot.reference_price, Some(2650.12));

        let futures = snapshot
            .feeds
            .iter()
            .find(|f| f.feed == Feed::BinanceFutures)
            .unwrap();
        assert!((futures.basis_usd.unwrap() - 0.88).abs() < 1e-9);
        assert!((futures.basis_bps.unwrap() - 3.32).abs() < 0.01);

        // Spot feed is FX conversion only, never a basis row
        let spot = snapshot
            .feeds
            .iter()
            .find(|f| f.feed == Feed::BinanceSpot)
            .unwrap();
        assert_eq!(spot.basis_usd, None);

        let implied = snapshot.implied_xau_usdc.unwrap();
        assert!((implied - 2651.0 / 0.9998).abs() < 1e-9);

        assert!((snapshot.funding_apy_pct.unwrap() - 11.5714).abs() < 0.001);
        assert_eq!(snapshot.dislocations.len(), 2);
        assert!((snapshot.dislocations[0].usd.unwrap() - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_session_change_from_buffer_ends() {
        let engine = engine();
        engine
            .apply_tick(
                1_000,
                &[outcome(Feed::Pyth, Some(NormalizedQuote::mid_only(2650.0)), None)],
            )
            .await;
        engine
            .apply_tick(
                61_000,
                &[outcome(Feed::Pyth, Some(NormalizedQuote::mid_only(2655.0)), None)],
            )
            .await;

        let snapshot = engine.snapshot(61_000).await;
        assert_eq!(snapshot.session_change_usd, Some(5.0));
        assert!((snapshot.session_change_pct.unwrap() - 5.0 / 2650.0 * 100.0).abs() < 1e-12);
    }
}
