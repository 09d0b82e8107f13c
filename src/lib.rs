//! GoldBasis Library
//!
//! Feed-reconciliation and basis-computation engine for a gold (XAU/USD)
//! basis terminal: polls an oracle plus several venues, normalizes their
//! quotes, tracks freshness, and maintains a rolling basis time-series.

pub mod config;
pub mod engine;
pub mod error;
pub mod feeds;
pub mod types;

#[cfg(feature = "dashboard")]
pub mod dashboard;
