//! Feed state store
//!
//! One record per tracked feed, holding the last good value and the
//! freshness/latency/error bookkeeping the diagnostics view reads. Records
//! are replaced wholesale on success and left untouched (stale) on failure,
//! so basis math degrades to stale-but-valid data instead of NaN.

use std::collections::HashMap;

use crate::feeds::FetchOutcome;
use crate::types::{AggregateStatus, Feed, FeedStatus};

/// Per-feed record
#[derive(Debug, Clone)]
pub struct FeedRecord {
    /// Last good mid (oracle price for the reference feed). NaN until the
    /// first success; never overwritten with a non-finite value.
    pub mid: f64,
    /// Oracle publish time, unix ms
    pub publish_time_ms: Option<i64>,
    /// Last funding rate fraction (futures venue)
    pub funding_rate: Option<f64>,
    /// Next scheduled funding time, unix ms (futures venue)
    pub next_funding_time_ms: Option<i64>,
    /// Tick timestamp of the last success, unix ms
    pub last_success_ms: Option<i64>,
    /// Latency of the most recent attempt, success or not
    pub last_latency_ms: Option<u64>,
    /// Feed-prefixed message of the most recent failure, empty when healthy
    pub last_error: String,
}

impl Default for FeedRecord {
    fn default() -> Self {
        Self {
            mid: f64::NAN,
            publish_time_ms: None,
            funding_rate: None,
            next_funding_time_ms: None,
            last_success_ms: None,
            last_latency_ms: None,
            last_error: String::new(),
        }
    }
}

impl FeedRecord {
    /// Freshness classification at `now`
    pub fn status(&self, now: i64, stale_ms: i64) -> FeedStatus {
        if !self.last_error.is_empty() {
            return FeedStatus::Err;
        }
        match self.last_success_ms {
            None => FeedStatus::Err,
            Some(ok_ms) if now - ok_ms > stale_ms => FeedStatus::Stale,
            Some(_) => FeedStatus::Ok,
        }
    }

    fn is_fresh(&self, now: i64, stale_ms: i64) -> bool {
        self.last_success_ms
            .is_some_and(|ok_ms| now - ok_ms <= stale_ms)
    }
}

/// Single source of truth for per-feed state, mutated only by the
/// orchestrator during reconciliation
#[derive(Debug)]
pub struct FeedStateStore {
    records: HashMap<Feed, FeedRecord>,
}

impl Default for FeedStateStore {
    fn default() -> Self {
        let records = Feed::ALL
            .into_iter()
            .map(|feed| (feed, FeedRecord::default()))
            .collect();
        Self { records }
    }
}

impl FeedStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, feed: Feed) -> &FeedRecord {
        // All feeds are seeded in the constructor
        &self.records[&feed]
    }

    /// Apply one tick outcome for one feed.
    ///
    /// On success the value fields are replaced and `last_success_ms` is
    /// stamped with the tick timestamp; on failure the value fields keep
    /// their previous (possibly stale) contents and only the error text
    /// changes. Latency is recorded either way.
    pub fn apply_outcome(&mut self, outcome: &FetchOutcome, tick_ms: i64) {
        let record = self.records.entry(outcome.feed).or_default();
        record.last_latency_ms = Some(outcome.elapsed_ms);

        match (&outcome.quote, &outcome.error) {
            (Some(quote), _) => {
                record.mid = quote.mid;
                record.publish_time_ms = quote.publish_time_ms.or(record.publish_time_ms);
                record.funding_rate = quote.funding_rate.or(record.funding_rate);
                record.next_funding_time_ms =
                    quote.next_funding_time_ms.or(record.next_funding_time_ms);
                record.last_success_ms = Some(tick_ms);
                record.last_error.clear();
            }
            (None, error) => {
                let msg = error.as_deref().unwrap_or("unknown error");
                record.last_error = format!("{}: {}", outcome.feed.label(), msg);
            }
        }
    }

    /// Aggregate classification for the header status light
    pub fn aggregate_status(&self, now: i64, stale_ms: i64) -> AggregateStatus {
        let oracle = self.record(Feed::Pyth);
        if oracle.last_success_ms.is_none() {
            return AggregateStatus::Error;
        }
        if !oracle.is_fresh(now, stale_ms) {
            return AggregateStatus::Stale;
        }
        let all_venues_fresh = Feed::ALL
            .into_iter()
            .filter(|f| !f.is_oracle())
            .all(|f| self.record(f).is_fresh(now, stale_ms) && self.record(f).last_error.is_empty());
        if all_venues_fresh {
            AggregateStatus::Live
        } else {
            AggregateStatus::Partial
        }
    }

    /// Per-feed errors joined into one display line
    pub fn error_summary(&self) -> String {
        Feed::ALL
            .into_iter()
            .map(|f| self.record(f).last_error.as_str())
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>()
            .join(" \u{2022} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::{FetchOutcome, NormalizedQuote};

    fn ok_outcome(feed: Feed, mid: f64) -> FetchOutcome {
        FetchOutcome {
            feed,
            quote: Some(NormalizedQuote::mid_only(mid)),
            elapsed_ms: 12,
            error: None,
        }
    }

    fn err_outcome(feed: Feed, msg: &str) -> FetchOutcome {
        FetchOutcome {
            feed,
            quote: None,
            elapsed_ms: 34,
            error: Some(msg.to_string()),
        }
    }

    #[test]
    fn test_success_replaces_and_stamps() {
        let mut store = FeedStateStore::new();
        store.apply_outcome(&ok_outcome(Feed::BinanceFutures, 2651.0), 10_000);
        let record = store.record(Feed::BinanceFutures);
        assert_eq!(record.mid, 2651.0);
        assert_eq!(record.last_success_ms, Some(10_000));
        assert_eq!(record.last_latency_ms, Some(12));
        assert!(record.last_error.is_empty());
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut store = FeedStateStore::new();
        store.apply_outcome(&ok_outcome(Feed::Meteora, 2652.5), 10_000);
        store.apply_outcome(&err_outcome(Feed::Meteora, "HTTP 500"), 15_000);
        let record = store.record(Feed::Meteora);
        assert_eq!(record.mid, 2652.5);
        assert_eq!(record.last_success_ms, Some(10_000));
        assert_eq!(record.last_latency_ms, Some(34));
        assert_eq!(record.last_error, "METEORA: HTTP 500");
    }

    #[test]
    fn test_status_classification() {
        let mut store = FeedStateStore::new();
        assert_eq!(store.record(Feed::Pyth).status(0, 30_000), FeedStatus::Err);

        store.apply_outcome(&ok_outcome(Feed::Pyth, 2650.12), 10_000);
        assert_eq!(
            store.record(Feed::Pyth).status(20_000, 30_000),
            FeedStatus::Ok
        );
        assert_eq!(
            store.record(Feed::Pyth).status(50_000, 30_000),
            FeedStatus::Stale
        );
    }

    #[test]
    fn test_aggregate_error_until_oracle_succeeds() {
        let mut store = FeedStateStore::new();
        for feed in Feed::ALL.into_iter().filter(|f| !f.is_oracle()) {
            store.apply_outcome(&ok_outcome(feed, 2651.0), 10_000);
        }
        store.apply_outcome(&err_outcome(Feed::Pyth, "HTTP 500"), 10_000);
        assert_eq!(
            store.aggregate_status(10_000, 30_000),
            AggregateStatus::Error
        );
    }

    #[test]
    fn test_aggregate_partial_on_venue_failure() {
        let mut store = FeedStateStore::new();
        for feed in Feed::ALL {
            store.apply_outcome(&ok_outcome(feed, 2651.0), 10_000);
        }
        store.apply_outcome(&err_outcome(Feed::Hyperliquid, "timeout"), 15_000);
        store.apply_outcome(&err_outcome(Feed::Meteora, "HTTP 429"), 15_000);
        assert_eq!(
            store.aggregate_status(15_000, 30_000),
            AggregateStatus::Partial
        );
        // Failed venues keep their last good values
        assert_eq!(store.record(Feed::Hyperliquid).mid, 2651.0);
        assert_eq!(store.record(Feed::Meteora).mid, 2651.0);
    }

    #[test]
    fn test_aggregate_live_and_stale() {
        let mut store = FeedStateStore::new();
        for feed in Feed::ALL {
            store.apply_outcome(&ok_outcome(feed, 2651.0), 10_000);
        }
        assert_eq!(store.aggregate_status(20_000, 30_000), AggregateStatus::Live);
        assert_eq!(
            store.aggregate_status(100_000, 30_000),
            AggregateStatus::Stale
        );
    }

    #[test]
    fn test_error_summary_concatenates() {
        let mut store = FeedStateStore::new();
        store.apply_outcome(&err_outcome(Feed::Pyth, "HTTP 500"), 1_000);
        store.apply_outcome(&err_outcome(Feed::Meteora, "bad pool"), 1_000);
        let summary = store.error_summary();
        assert!(summary.contains("PYTH: HTTP 500"));
        assert!(summary.contains("METEORA: bad pool"));
        assert!(summary.contains("\u{2022}"));
    }
}
