//! Binance adapters
//!
//! Futures: best bid/ask plus funding info for XAUUSDT, fetched concurrently.
//! Spot: USDCUSDT mid, used only as an FX conversion factor.
//!
//! Binance serializes prices and rates as JSON strings.

use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;
use crate::feeds::{NormalizedQuote, QuoteSource};
use crate::types::Feed;
use async_trait::async_trait;

#[derive(Debug, Deserialize)]
struct BookTicker {
    #[serde(rename = "bidPrice")]
    bid_price: String,
    #[serde(rename = "askPrice")]
    ask_price: String,
}

#[derive(Debug, Deserialize)]
struct PremiumIndex {
    #[serde(rename = "lastFundingRate")]
    last_funding_rate: String,
    #[serde(rename = "nextFundingTime")]
    next_funding_time: i64,
}

fn mid_from_book(book: &BookTicker) -> Result<f64, FetchError> {
    let bid: f64 = book
        .bid_price
        .parse()
        .map_err(|_| FetchError::InvalidResponse("bidPrice not numeric".into()))?;
    let ask: f64 = book
        .ask_price
        .parse()
        .map_err(|_| FetchError::InvalidResponse("askPrice not numeric".into()))?;
    let mid = (bid + ask) / 2.0;
    if !mid.is_finite() {
        return Err(FetchError::NonFinite(format!("mid from {}/{}", bid, ask)));
    }
    Ok(mid)
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, FetchError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Http(response.status().as_u16()));
    }
    Ok(response.json().await?)
}

/// Binance USD-M futures adapter (XAUUSDT)
#[derive(Debug, Clone)]
pub struct BinanceFuturesSource {
    client: Client,
    base_url: String,
    symbol: String,
}

impl BinanceFuturesSource {
    pub fn new(client: Client, base_url: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            symbol: symbol.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for BinanceFuturesSource {
    fn feed(&self) -> Feed {
        Feed::BinanceFutures
    }

    async fn fetch_quote(&self) -> Result<NormalizedQuote, FetchError> {
        let book_url = format!(
            "{}/fapi/v1/ticker/bookTicker?symbol={}",
            self.base_url, self.symbol
        );
        let premium_url = format!(
            "{}/fapi/v1/premiumIndex?symbol={}",
            self.base_url, self.symbol
        );

        let (book, premium): (BookTicker, PremiumIndex) = tokio::try_join!(
            get_json(&self.client, &book_url),
            get_json(&self.client, &premium_url),
        )?;

        let mid = mid_from_book(&book)?;
        // A malformed funding field degrades to "no funding info", not a failed quote
        let funding_rate = premium.last_funding_rate.parse::<f64>().ok();

        Ok(NormalizedQuote {
            mid,
            publish_time_ms: None,
            funding_rate,
            next_funding_time_ms: Some(premium.next_funding_time),
        })
    }
}

/// Binance spot adapter (USDCUSDT), FX conversion only
#[derive(Debug, Clone)]
pub struct BinanceSpotSource {
    client: Client,
    base_url: String,
    symbol: String,
}

impl BinanceSpotSource {
    pub fn new(client: Client, base_url: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            symbol: symbol.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for BinanceSpotSource {
    fn feed(&self) -> Feed {
        Feed::BinanceSpot
    }

    async fn fetch_quote(&self) -> Result<NormalizedQuote, FetchError> {
        let url = format!(
            "{}/api/v3/ticker/bookTicker?symbol={}",
            self.base_url, self.symbol
        );
        let book: BookTicker = get_json(&self.client, &url).await?;
        let mid = mid_from_book(&book)?;
        if mid <= 0.0 {
            return Err(FetchError::NonFinite(format!("non-positive spot mid {}", mid)));
        }
        Ok(NormalizedQuote::mid_only(mid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_from_book() {
        let book = BookTicker {
            bid_price: "2650.5".into(),
            ask_price: "2651.5".into(),
        };
        assert_eq!(mid_from_book(&book).unwrap(), 2651.0);
    }

    #[test]
    fn test_mid_rejects_non_numeric() {
        let book = BookTicker {
            bid_price: "n/a".into(),
            ask_price: "2651.5".into(),
        };
        assert!(matches!(
            mid_from_book(&book),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_premium_index_parses_string_rate() {
        let premium: PremiumIndex = serde_json::from_str(
            r#"{"lastFundingRate":"0.00010000","nextFundingTime":1714003200000}"#,
        )
        .unwrap();
        assert_eq!(premium.last_funding_rate.parse::<f64>().unwrap(), 0.0001);
        assert_eq!(premium.next_funding_time, 1_714_003_200_000);
    }
}
