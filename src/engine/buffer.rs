//! Rolling time-series buffer of basis samples
//!
//! Append-only with front eviction. Ticks fire in non-decreasing timestamp
//! order, so insertion order is chronological order; a completion-order
//! inversion between two overlapping ticks is tolerated (each sample carries
//! its own timestamp).

use std::collections::VecDeque;

use serde::Serialize;
use std::collections::HashMap;

use crate::types::Feed;

/// One venue's basis values inside a sample
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VenueBasis {
    pub basis_usd: Option<f64>,
    pub basis_bps: Option<f64>,
}

/// Immutable per-tick sample
#[derive(Debug, Clone, Serialize)]
pub struct BasisSample {
    /// Tick timestamp, unix ms
    pub t: i64,
    /// Oracle price at the tick, if defined
    pub reference_price: Option<f64>,
    /// Basis per tracked venue
    pub venues: HashMap<Feed, VenueBasis>,
    /// Annualized funding yield from the futures venue
    pub funding_apy_pct: Option<f64>,
}

/// Bounded rolling window over basis samples
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: VecDeque<BasisSample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample at the end. O(1).
    pub fn append(&mut self, sample: BasisSample) {
        self.samples.push_back(sample);
    }

    /// Evict leading samples older than `now - window_ms`. Idempotent.
    pub fn prune(&mut self, now: i64, window_ms: u64) {
        let cutoff = now - window_ms as i64;
        while self.samples.front().is_some_and(|s| s.t < cutoff) {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BasisSample> {
        self.samples.iter()
    }

    pub fn front(&self) -> Option<&BasisSample> {
        self.samples.front()
    }

    pub fn back(&self) -> Option<&BasisSample> {
        self.samples.back()
    }
}
