//! Price feed adapters (Pyth, Binance futures/spot, Hyperliquid, Meteora)
//!
//! Each adapter maps one venue's raw response into a [`NormalizedQuote`] or a
//! typed [`FetchError`]. Adapters hold fixed configuration plus a shared
//! `reqwest::Client` and no mutable state, so a tick can invoke all of them
//! concurrently.

mod binance;
mod hyperliquid;
mod meteora;
mod pyth;

pub use binance::{BinanceFuturesSource, BinanceSpotSource};
pub use hyperliquid::HyperliquidSource;
pub use meteora::MeteoraSource;
pub use pyth::PythSource;

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::types::Feed;
use async_trait::async_trait;

/// Normalized quote from any feed
#[derive(Debug, Clone, Copy)]
pub struct NormalizedQuote {
    /// Mid price (oracle price for the reference feed)
    pub mid: f64,
    /// Oracle publish time in unix ms, when the venue reports one
    pub publish_time_ms: Option<i64>,
    /// Last funding rate as a fraction per funding interval
    pub funding_rate: Option<f64>,
    /// Next scheduled funding time in unix ms
    pub next_funding_time_ms: Option<i64>,
}

impl NormalizedQuote {
    /// Quote carrying only a mid price
    pub fn mid_only(mid: f64) -> Self {
        Self {
            mid,
            publish_time_ms: None,
            funding_rate: None,
            next_funding_time_ms: None,
        }
    }
}

/// Trait for venue quote sources
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Which feed this source produces
    fn feed(&self) -> Feed;

    /// Fetch and normalize one quote
    async fn fetch_quote(&self) -> Result<NormalizedQuote, FetchError>;
}

/// Uniform outcome of one timed adapter invocation
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub feed: Feed,
    /// Present on success, absent on failure
    pub quote: Option<NormalizedQuote>,
    /// Time until settlement, success or not
    pub elapsed_ms: u64,
    /// Error string on failure
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.quote.is_some()
    }
}

/// Invoke one adapter, measure elapsed time and flatten the result.
///
/// This is the sole boundary that converts heterogeneous failure modes
/// (HTTP status, transport, parse, missing key) into data. It never returns
/// an error to its caller.
pub async fn timed_fetch(source: &dyn QuoteSource) -> FetchOutcome {
    let started = Instant::now();
    let result = source.fetch_quote().await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(quote) => FetchOutcome {
            feed: source.feed(),
            quote: Some(quote),
            elapsed_ms,
            error: None,
        },
        Err(e) => FetchOutcome {
            feed: source.feed(),
            quote: None,
            elapsed_ms,
            error: Some(e.to_string()),
        },
    }
}

/// Build the full adapter set from configuration, sharing one HTTP client
pub fn build_sources(config: &AppConfig) -> Result<Vec<Box<dyn QuoteSource>>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    Ok(vec![
        Box::new(PythSource::new(
            client.clone(),
            config.pyth.base_url.clone(),
            config.pyth.feed_id.clone(),
        )),
        Box::new(BinanceFuturesSource::new(
            client.clone(),
            config.binance.futures_base_url.clone(),
            config.binance.futures_symbol.clone(),
        )),
        Box::new(BinanceSpotSource::new(
            client.clone(),
            config.binance.spot_base_url.clone(),
            config.binance.spot_symbol.clone(),
        )),
        Box::new(HyperliquidSource::new(
            client.clone(),
            config.hyperliquid.info_url.clone(),
            config.hyperliquid.dex.clone(),
        )),
        Box::new(MeteoraSource::new(
            client,
            config.meteora.base_url.clone(),
            config.meteora.pool_address.clone(),
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        result: Result<f64, FetchError>,
    }

    #[async_trait]
    impl QuoteSource for FixedSource {
        fn feed(&self) -> Feed {
            Feed::Pyth
        }

        async fn fetch_quote(&self) -> Result<NormalizedQuote, FetchError> {
            match &self.result {
                Ok(mid) => Ok(NormalizedQuote::mid_only(*mid)),
                Err(FetchError::Http(code)) => Err(FetchError::Http(*code)),
                Err(_) => Err(FetchError::InvalidResponse("test".into())),
            }
        }
    }

    #[test]
    fn test_timed_fetch_success() {
        let source = FixedSource {
            result: Ok(2650.12),
        };
        let outcome = tokio_test::block_on(timed_fetch(&source));
        assert!(outcome.is_ok());
        assert_eq!(outcome.quote.unwrap().mid, 2650.12);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_timed_fetch_failure_reports_elapsed_and_message() {
        let source = FixedSource {
            result: Err(FetchError::Http(502)),
        };
        let outcome = tokio_test::block_on(timed_fetch(&source));
        assert!(!outcome.is_ok());
        assert!(outcome.quote.is_none());
        assert_eq!(outcome.error.as_deref(), Some("HTTP 502"));
        // Elapsed is measured, not zeroed, on failure
        assert!(outcome.elapsed_ms < 1_000);
    }
}
